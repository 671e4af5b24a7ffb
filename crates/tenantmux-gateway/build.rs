//! Generates the `helloworld.Greeter` service glue.
//!
//! Messages are hand-written prost structs in `src/rpc/proto.rs`, so the
//! manual builder is used and no protoc install is required.

fn main() {
    let say_hello = tonic_build::manual::Method::builder()
        .name("say_hello")
        .route_name("SayHello")
        .input_type("crate::rpc::proto::HelloRequest")
        .output_type("crate::rpc::proto::HelloReply")
        .codec_path("tonic::codec::ProstCodec")
        .build();

    let streaming_hello = tonic_build::manual::Method::builder()
        .name("streaming_hello")
        .route_name("StreamingHello")
        .input_type("crate::rpc::proto::HelloRequest")
        .output_type("crate::rpc::proto::HelloReply")
        .codec_path("tonic::codec::ProstCodec")
        .client_streaming()
        .server_streaming()
        .build();

    let greeter = tonic_build::manual::Service::builder()
        .name("Greeter")
        .package("helloworld")
        .method(say_hello)
        .method(streaming_hello)
        .build();

    tonic_build::manual::Builder::new().compile(&[greeter]);
    println!("cargo:rerun-if-changed=build.rs");
}
