pub mod cart_store;
pub mod discount_repo;
pub mod gateway;
pub mod models;
pub mod order_repo;

#[cfg(test)]
pub(crate) mod test_db;
