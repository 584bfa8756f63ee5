pub mod intensity;
pub mod io;
pub mod traits;

pub use self::intensity::IntensityImage;
pub use self::traits::{ImageView, Rows};
