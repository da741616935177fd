mod archive;
mod cli;
mod logging;
mod runner;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::initialize(args.log.into());

    let summary = runner::run(&args)?;

    println!(
        "{} videos discovered, {} selected",
        summary.video_count, summary.selected_count
    );
    if summary.skipped_archived > 0 {
        println!(
            "{} already in the download archive, skipped",
            summary.skipped_archived
        );
    }
    if let Some(path) = &summary.zip_path {
        println!("ZIP bundle written to {}", path.display());
    } else {
        println!("{} videos saved to {}", summary.saved_count, args.out.display());
    }
    Ok(())
}
