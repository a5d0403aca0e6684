pub mod invoice;
pub mod order;
pub mod order_item;
pub mod product;
pub mod sale_record;
pub mod wallet_account;
pub mod withdraw_request;
