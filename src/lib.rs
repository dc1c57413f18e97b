#[macro_export]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		#[cfg(debug_assertions)]
		{
			eprintln!($($arg)*);
		}
	}};
}

pub mod annotator;
pub mod batch;
pub mod config;
pub mod locator;
pub mod prompt;
pub mod signature;
pub mod source;
