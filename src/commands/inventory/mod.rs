pub mod adjust_inventory_command;
pub mod bulk_adjust_inventory_command;

pub use adjust_inventory_command::AdjustInventoryCommand;
pub use bulk_adjust_inventory_command::BulkAdjustInventoryCommand;
