//! CourseTrack CLI — syllabus-to-calendar assignment tracker.
//!
//! Extracts assignments from uploaded syllabus documents, lets the user
//! review and edit them, exports calendar files, and generates per-course
//! study plans.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
