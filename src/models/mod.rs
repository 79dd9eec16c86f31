pub mod decision;
pub mod intake;
pub mod profile;
pub mod sheet;

pub use decision::*;
pub use intake::*;
pub use profile::*;
pub use sheet::*;
