pub use self::{
    cloud::CloudConfig, cloud_api::CloudApiConfig, forwarder::ForwarderConfig,
    ingress::IngressConfig, local_store::LocalStoreConfig, object_store::ObjectStoreConfig,
    verifier::VerifierConfig,
};

mod cloud;
mod cloud_api;
mod forwarder;
mod ingress;
mod local_store;
mod object_store;
mod verifier;
