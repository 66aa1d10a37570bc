pub use self::parser::Config;
pub use self::validator::ConfigError;

mod parser;
mod validator;
