pub mod assembler;
pub mod cart;
pub mod discount;
pub mod errors;
pub mod gateway;
pub mod order;
pub mod order_number;
pub mod payment;
pub mod ports;
pub mod pricing;
