pub mod create_order_command;
pub mod update_order_status_command;

// Re-export commands for easier access
pub use create_order_command::CreateOrderCommand;
pub use update_order_status_command::UpdateOrderStatusCommand;
