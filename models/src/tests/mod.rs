mod lock_record;
mod scope;
mod server_handle;
mod server_identity;
