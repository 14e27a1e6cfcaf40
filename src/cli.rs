use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipsection")]
#[command(version)]
#[command(about = "Find and unpack the ZIP archive appended to an executable", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipsection -s setup.exe          show where the embedded archive starts\n  \
  zipsection -l setup.exe          list files of the embedded archive\n  \
  zipsection setup.exe -d out      extract the payload into out/\n  \
  zipsection -p app.bin config.json | jq .   print one entry to stdout")]
pub struct Cli {
    /// Host file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Show the size and offset of the embedded archive
    #[arg(short = 's', long = "section")]
    pub section: bool,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Log filter, e.g. `debug` or `zipsection=trace` (overrides RUST_LOG)
    #[arg(long = "log-level", value_name = "FILTER")]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }
}
