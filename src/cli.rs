use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "wgtfile")]
#[command(version)]
#[command(about = "Inspect and extract widget packages", long_about = None)]
#[command(after_help = "Examples:\n  \
  wgtfile widget.wgt -d out            extract the whole package into out/\n  \
  wgtfile widget.wgt images -d out     extract the images directory\n  \
  wgtfile -c widget.wgt                print the component descriptor\n  \
  wgtfile -l widget.wgt                list package members\n\n\
Set RUST_LOG=debug to trace every directory and file decision.")]
pub struct Cli {
    /// Widget package path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files or directories to extract (default: all)
    #[arg(value_name = "NAMES")]
    pub names: Vec<String>,

    /// List members (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List members verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Print the package's config.xml
    #[arg(short = 'c')]
    pub config: bool,

    /// Extract into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Quiet mode
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe || self.config
    }

    /// Destination root for extraction.
    pub fn destination(&self) -> &str {
        self.extract_dir.as_deref().unwrap_or(".")
    }
}
