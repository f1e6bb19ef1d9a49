//! CLI argument parsing with clap derive macros.

use clap::{Parser, Subcommand};

/// UI automation metadata for AI agents.
///
/// Query the element registry of a running application and drive its UI by
/// identifier instead of screenshot analysis. Output is structured JSON
/// designed for agent consumption.
#[derive(Debug, Parser)]
#[command(name = "waymark", version)]
pub struct Cli {
    /// Target application by name [default: default]
    #[arg(short, long, global = true)]
    pub app: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List all tracked elements
    #[command(after_help = "\
Examples:
  waymark elements                      # All elements of the default app
  waymark elements -a notes             # All elements of a specific app
  waymark elements | jq '.elements[].identifier'")]
    Elements,

    /// Find identifiers matching a regex pattern
    #[command(after_help = "\
Patterns are case-insensitive and use search semantics (no anchoring).

Examples:
  waymark find 'button_.*'              # All buttons
  waymark find 'save'                   # Anything mentioning save")]
    Find(FindArgs),

    /// List elements intersecting a screen region
    #[command(name = "in-region")]
    InRegion(InRegionArgs),

    /// Tap an element at its center
    #[command(after_help = "\
Examples:
  waymark tap button_primary_save_changes
  waymark tap -a notes button_new_note")]
    Tap(TapArgs),

    /// Type text into an element
    #[command(name = "type")]
    Type(TypeArgs),

    /// Swipe between two screen points
    #[command(after_help = "\
Examples:
  waymark swipe 200 600 200 100         # Swipe up
  waymark swipe 10 300 300 300          # Swipe right")]
    Swipe(SwipeArgs),

    /// Wait for an element to appear
    #[command(after_help = "\
Examples:
  waymark wait button_done              # Wait up to 30s
  waymark wait -t 5000 spinner_gone     # Wait up to 5s")]
    Wait(WaitArgs),

    /// Show the active view context
    Context,

    /// Capture an atomic snapshot of elements plus context
    Snapshot,
}

#[derive(Debug, clap::Args)]
pub struct FindArgs {
    /// Regex pattern to match against identifiers
    pub pattern: String,
}

#[derive(Debug, clap::Args)]
pub struct InRegionArgs {
    /// Region origin x
    pub x: f64,

    /// Region origin y
    pub y: f64,

    /// Region width
    pub width: f64,

    /// Region height
    pub height: f64,
}

#[derive(Debug, clap::Args)]
pub struct TapArgs {
    /// Element identifier
    pub identifier: String,
}

#[derive(Debug, clap::Args)]
pub struct TypeArgs {
    /// Element identifier
    pub identifier: String,

    /// Text to type
    pub text: String,
}

#[derive(Debug, clap::Args)]
pub struct SwipeArgs {
    /// Start point x
    pub from_x: f64,

    /// Start point y
    pub from_y: f64,

    /// End point x
    pub to_x: f64,

    /// End point y
    pub to_y: f64,
}

#[derive(Debug, clap::Args)]
pub struct WaitArgs {
    /// Element identifier
    pub identifier: String,

    /// Timeout in milliseconds
    #[arg(short, long, default_value_t = 30000)]
    pub timeout: u64,
}
