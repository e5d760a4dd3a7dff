mod files;
mod lock;

pub use files::{
    CodeFile, WrittenFile, clear_working_dir, list_files, parse_code_files, save_code_files,
    summarize_files, write_code_files,
};
pub use lock::{WorkDirGuard, lock_work_dir};
