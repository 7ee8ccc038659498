pub mod agent_service;
pub mod calendar_gateway;
pub mod orchestrator;
pub mod routing;
pub mod time_resolver;
