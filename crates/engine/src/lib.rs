pub mod nse;
pub mod scanner;
pub mod yahoo;

pub use nse::NseUniverse;
pub use scanner::Scanner;
pub use yahoo::YahooClient;
