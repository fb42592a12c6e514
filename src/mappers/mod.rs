/*
Module: mappers

Dispatcher module: declares the concrete board implementations and re-exports
their public types. `crate::mapper::create` picks one by iNES mapper number.

Implemented:
- MMC1 (Mapper 1)
- UxROM (Mapper 2)
- CNROM (Mapper 3)
- MMC3 (Mapper 4)
- MMC5 (Mapper 5)
- AxROM (Mapper 7)
- MMC2 / MMC4 (Mappers 9 / 10)
- Color Dreams (Mapper 11)
- GxROM (Mapper 66)
- Sunsoft FME-7 (Mapper 69)
*/

pub mod axrom;
pub mod cnrom;
pub mod color_dreams;
pub mod fme7;
pub mod gxrom;
pub mod mmc1;
pub mod mmc2;
pub mod mmc3;
pub mod mmc5;
pub mod uxrom;

pub use axrom::Axrom;
pub use cnrom::Cnrom;
pub use color_dreams::ColorDreams;
pub use fme7::Fme7;
pub use gxrom::Gxrom;
pub use mmc1::Mmc1;
pub use mmc2::Mmc2;
pub use mmc3::Mmc3;
pub use mmc5::Mmc5;
pub use uxrom::Uxrom;
