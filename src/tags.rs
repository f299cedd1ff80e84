//! Typed access to embedded EXIF/IPTC fields.
//!
//! The metadata extractor never touches a tag library directly; it asks a
//! [`TagSource`] for fields through typed accessors. Each accessor returns
//! `None` both when a field is absent and when a present field fails to
//! parse, so one mangled tag costs exactly one output field and extraction
//! of the rest continues.
//!
//! The production implementation is [`FileTagSource`]: EXIF via
//! `kamadak-exif`, IPTC via the in-crate [`crate::iptc`] parser.

use crate::iptc::{self, IptcData};
use exif::{In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Fields the metadata extractor can ask a tag source for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// IPTC Caption-Abstract (2:120).
    IptcCaption,
    /// IPTC Copyright Notice (2:116).
    IptcCopyright,
    /// EXIF ImageDescription.
    Description,
    /// EXIF Copyright.
    Copyright,
    /// EXIF Artist.
    Artist,
    /// EXIF DateTimeOriginal, `YYYY:MM:DD HH:MM:SS`.
    CaptureTime,
    GpsLatitudeRef,
    GpsLatitude,
    GpsLongitudeRef,
    GpsLongitude,
    ExposureTime,
    FNumber,
    /// EXIF ISOSpeedRatings / PhotographicSensitivity.
    Iso,
    /// EXIF FocalLengthIn35mmFilm.
    FocalLength35,
}

/// Capability interface over a file's embedded descriptive tags.
pub trait TagSource {
    /// Text field, verbatim (no blank filtering — precedence rules decide).
    fn string_field(&self, field: Field) -> Option<String>;

    /// Single rational as a float. A zero denominator is a malformed tag.
    fn rational_field(&self, field: Field) -> Option<f64>;

    /// Degrees/minutes/seconds rational triple, as used by the GPS tags.
    fn rational_triple_field(&self, field: Field) -> Option<[f64; 3]>;

    /// Unsigned integer field.
    fn integer_field(&self, field: Field) -> Option<u32>;
}

/// Tag source backed by whatever the file actually carries.
///
/// Construction never fails: unreadable or tag-less files yield a source
/// whose accessors all return `None`.
pub struct FileTagSource {
    exif: Option<exif::Exif>,
    iptc: IptcData,
}

impl FileTagSource {
    pub fn open(path: &Path) -> Self {
        let exif = File::open(path).ok().and_then(|file| {
            exif::Reader::new()
                .read_from_container(&mut BufReader::new(file))
                .ok()
        });
        Self {
            exif,
            iptc: iptc::read_iptc(path),
        }
    }

    fn exif_field(&self, field: Field) -> Option<&exif::Field> {
        let tag = match field {
            Field::Description => Tag::ImageDescription,
            Field::Copyright => Tag::Copyright,
            Field::Artist => Tag::Artist,
            Field::CaptureTime => Tag::DateTimeOriginal,
            Field::GpsLatitudeRef => Tag::GPSLatitudeRef,
            Field::GpsLatitude => Tag::GPSLatitude,
            Field::GpsLongitudeRef => Tag::GPSLongitudeRef,
            Field::GpsLongitude => Tag::GPSLongitude,
            Field::ExposureTime => Tag::ExposureTime,
            Field::FNumber => Tag::FNumber,
            Field::Iso => Tag::PhotographicSensitivity,
            Field::FocalLength35 => Tag::FocalLengthIn35mmFilm,
            // IPTC fields never come from the EXIF reader
            Field::IptcCaption | Field::IptcCopyright => return None,
        };
        self.exif.as_ref()?.get_field(tag, In::PRIMARY)
    }
}

impl TagSource for FileTagSource {
    fn string_field(&self, field: Field) -> Option<String> {
        match field {
            Field::IptcCaption => self.iptc.caption.clone(),
            Field::IptcCopyright => self.iptc.copyright.clone(),
            _ => match &self.exif_field(field)?.value {
                Value::Ascii(lines) => lines
                    .first()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            },
        }
    }

    fn rational_field(&self, field: Field) -> Option<f64> {
        match &self.exif_field(field)?.value {
            Value::Rational(values) => rational_to_f64(values.first()?),
            Value::Short(values) => values.first().map(|&n| f64::from(n)),
            Value::Long(values) => values.first().map(|&n| f64::from(n)),
            _ => None,
        }
    }

    fn rational_triple_field(&self, field: Field) -> Option<[f64; 3]> {
        match &self.exif_field(field)?.value {
            Value::Rational(values) if values.len() >= 3 => Some([
                rational_to_f64(&values[0])?,
                rational_to_f64(&values[1])?,
                rational_to_f64(&values[2])?,
            ]),
            _ => None,
        }
    }

    fn integer_field(&self, field: Field) -> Option<u32> {
        match &self.exif_field(field)?.value {
            Value::Short(values) => values.first().map(|&n| u32::from(n)),
            Value::Long(values) => values.first().copied(),
            _ => None,
        }
    }
}

/// A zero-denominator rational is a malformed tag, not a division.
fn rational_to_f64(rational: &exif::Rational) -> Option<f64> {
    if rational.denom == 0 {
        None
    } else {
        Some(rational.num as f64 / rational.denom as f64)
    }
}
