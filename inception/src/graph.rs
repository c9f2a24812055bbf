use convnet_core::prelude::*;

/// A finished network: its graph, feature (or logits) output and optional
/// auxiliary head output.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    model: TypedModel,
    output: OutletId,
    auxiliary: Option<OutletId>,
}

impl NetworkGraph {
    /// The model outputs are set to the main output, then the auxiliary one.
    pub(crate) fn new(
        model: TypedModel,
        output: OutletId,
        auxiliary: Option<OutletId>,
    ) -> NetResult<NetworkGraph> {
        let outputs: Vec<OutletId> = std::iter::once(output).chain(auxiliary).collect();
        let model = model.with_output_outlets(&outputs)?;
        Ok(NetworkGraph { model, output, auxiliary })
    }

    pub fn model(&self) -> &TypedModel {
        &self.model
    }

    pub fn into_model(self) -> TypedModel {
        self.model
    }

    pub fn output(&self) -> OutletId {
        self.output
    }

    pub fn auxiliary(&self) -> Option<OutletId> {
        self.auxiliary
    }

    pub fn output_fact(&self) -> NetResult<&TypedFact> {
        self.model.outlet_fact(self.output)
    }

    pub fn auxiliary_fact(&self) -> NetResult<Option<&TypedFact>> {
        self.auxiliary.map(|aux| self.model.outlet_fact(aux)).transpose()
    }
}
