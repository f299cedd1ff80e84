use clap::Parser;
use shoebox::{output, video, walk};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup — trivial, called exactly once
        Box::leak(format!("{}+{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "shoebox")]
#[command(about = "Album metadata and thumbnail cache generator for web photo galleries")]
#[command(long_about = "\
Album metadata and thumbnail cache generator for web photo galleries

Walks a folder tree of photos and videos and fills a hidden cache with one
entry per album, image, and video, for a gallery frontend to serve:

  photos/
  ├── .shoebox/                  # the cache (excluded from scans)
  │   └── <md5 of relative path>/
  │       ├── meta.json          # captions, dates, camera fields
  │       └── tn.jpg             # 125x125 thumbnail
  ├── Holiday/                   # directory = album
  │   ├── beach.jpg
  │   ├── surf.mp4               # video...
  │   └── surf.jpg               # ...with its same-named poster image
  └── portrait.png

Captions come from IPTC/EXIF tags with the file name as fallback; dates
from the EXIF capture timestamp, else the file's modification time. Every
run is a full rebuild — previously cached entries are overwritten in place.

Build with the `ffmpeg` feature to thumbnail videos that have no poster
image; without it such videos are skipped with a warning.")]
#[command(version = version_string())]
struct Cli {
    /// Folder(s) to process; each gets a full cache rebuild under
    /// <folder>/.shoebox
    #[arg(required = true)]
    folders: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let frames = video::detect();

    for folder in &cli.folders {
        output::print_run_header(folder);
        let stats = walk::process_tree(folder, frames.as_deref())?;
        output::print_run_summary(&stats);
    }

    Ok(())
}
