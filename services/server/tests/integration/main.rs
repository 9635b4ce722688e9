mod helpers;
mod registry_test;
mod router_test;
