//! Messages, client and server of the `rbns.Permission` service.

tonic::include_proto!("rbns");
