pub mod gray;
pub mod io;
pub mod morph;
pub mod rgb;
pub mod traits;

pub use self::gray::ImageGray8;
pub use self::rgb::{Channel, ImageRgb8};
pub use self::traits::{ImageView, Rows};
