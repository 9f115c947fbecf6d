pub mod create_product_command;
pub mod create_variant_command;

pub use create_product_command::CreateProductCommand;
pub use create_variant_command::CreateVariantCommand;
