//! `helloworld` wire messages and the generated `Greeter` service glue.

/// Greeting request. Sent once per unary call, repeatedly on a stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HelloRequest {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
}

/// Greeting plus the environment descriptors of the serving instance.
#[derive(Clone, PartialEq, ::prost::Message, ::serde::Serialize)]
pub struct HelloReply {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub version: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub hostname: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub tenant_id: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub zone: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub nodename: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub region: ::prost::alloc::string::String,
    #[prost(string, tag = "8")]
    pub clustername: ::prost::alloc::string::String,
    #[prost(string, tag = "9")]
    pub project: ::prost::alloc::string::String,
}

include!(concat!(env!("OUT_DIR"), "/helloworld.Greeter.rs"));
