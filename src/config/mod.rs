//! Configuration.
//!
//! Tiers merged field-by-field, lowest first:
//! 1. **Defaults** - built in
//! 2. **Project** - `$CWD/task-calendar/config.yaml`
//! 3. **User** - `~/.task-calendar/config.yaml`
//! 4. **Environment** - variables below
//!
//! An explicit config file (`--config` or `TASK_CALENDAR_CONFIG_PATH`) replaces tiers 2 and 3.
//!
//! ## Environment Variables
//! - `TASK_CALENDAR_CONFIG_PATH` - Explicit config file
//! - `TASK_CALENDAR_DB_PATH` - Database path
//! - `TASK_CALENDAR_UPLOAD_DIR` - Image upload directory
//! - `TASK_CALENDAR_PORT` - Listen port
//! - `TASK_CALENDAR_USER_DIR` - User config dir (default: `~/.task-calendar`)
//! - `TASK_CALENDAR_PROJECT_DIR` - Project config dir (default: `./task-calendar`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
