//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (every outcome or scenario matched)          |
//! | 1    | Differences found                                    |
//! | 2    | CLI usage error (bad args)                           |
//! | 3    | Config missing, unparseable or invalid               |
//! | 4    | Report or prompt file could not be written           |
//! | 5    | Sample key source could not be opened                |
//! | 6    | Report to analyze is missing or unreadable           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed, nothing differs.
pub const EXIT_SUCCESS: u8 = 0;

/// At least one endpoint outcome or status scenario did not match.
/// Like `diff(1)`, exit 1 means "responses differ."
pub const EXIT_DIFFS: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Run config could not be read, parsed or validated.
pub const EXIT_CONFIG: u8 = 3;

/// Report, fix request or prompt could not be written.
pub const EXIT_REPORT_IO: u8 = 4;

/// Sample database could not be opened.
pub const EXIT_SAMPLES: u8 = 5;

/// `analyze` input report is missing or unreadable.
pub const EXIT_ANALYZE_INPUT: u8 = 6;
