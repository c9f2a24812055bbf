use anyhow::Result;
use convnet_inception::prelude::*;

use crate::DumpArgs;

pub fn handle(args: &DumpArgs) -> Result<()> {
    let config = InceptionConfig::default()
        .with_image_size(args.image_size)
        .with_batch_size(args.batch_size)
        .with_data_format(args.data_format)
        .with_auxiliary(args.auxiliary)
        .with_batch_norm(!args.no_batch_norm)
        .with_phase_train(!args.eval);
    let inception = Inception::new(&args.model, config)?;
    let mut graph = inception.inference(&inception.image_fact())?;
    if let Some(classes) = args.num_classes {
        graph = inception.logits(graph, classes)?;
    }

    let model = graph.model();
    for node in model.nodes() {
        let info = node.op().info()?;
        if info.is_empty() {
            println!("{}", node.summary());
        } else {
            println!("{} [{}]", node.summary(), info.join(", "));
        }
    }
    println!();
    println!("nodes: {}", model.nodes_len());
    println!("trainable parameters: {}", model.parameter_count()?);
    println!("output: {}", graph.output_fact()?);
    if let Some(aux) = graph.auxiliary_fact()? {
        println!("auxiliary: {aux}");
    }
    Ok(())
}
