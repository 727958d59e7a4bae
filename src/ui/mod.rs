//! Terminal and NDJSON rendering for the CLI

pub mod json;
pub mod output;

use is_terminal::IsTerminal;

/// ANSI colors only when stdout is a terminal and NO_COLOR is unset
pub fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
