pub mod backend_gateway;
pub mod session_observer;
