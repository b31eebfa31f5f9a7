use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The story file to play
    pub game_file: String,
    /// Log at debug level
    #[arg(short, long)]
    pub debug: bool,
}
