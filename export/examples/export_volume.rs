use cloud_core::{
    Channel, ChannelConfig, ChannelPipeline, Dimensionality, ExportComposite, FractalParams,
    GenerationRequest,
};
use cloud_export::{ExportStatus, Exporter};
use tokio::runtime::Builder;

fn main() {
    let mut request = GenerationRequest {
        dimensionality: Dimensionality::ThreeD,
        resolution: 32,
        show_channels: vec![Channel::Red, Channel::Blue],
        ..GenerationRequest::default()
    };
    request.channels.red = ChannelConfig::Perlin(FractalParams {
        scale: 6.0,
        ..FractalParams::default()
    });
    request.channels.blue = ChannelConfig::Curl(FractalParams::default());

    let fields = ChannelPipeline::default()
        .resolve_all(&request)
        .expect("valid request");
    let composite = ExportComposite::new(fields, &request.show_channels);

    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build Tokio runtime");

    rt.block_on(async {
        let handle = Exporter::new()
            .start(composite, "volume/clouds.png")
            .expect("export start failed");
        let mut status = handle.subscribe();
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            println!("{current}");
            if current.is_done() {
                break;
            }
        }
        match handle.wait().await {
            Ok(summary) => println!("wrote {} files", summary.files.len()),
            Err(e) => eprintln!("export failed: {e}"),
        }
    });
}
