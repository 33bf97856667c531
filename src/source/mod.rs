//! Generator sources: descriptors, registry and normalization

pub mod descriptor;
pub mod normalize;
pub mod registry;

pub use descriptor::{
    CachePolicy, DescriptorBuilder, GeneratorFn, GeneratorKind, InputMode, OutputParser,
    ProcessSpec, RuntimeCondition, SourceDescriptor, StaticCondition, WorkspaceContext,
};
pub use registry::{RegisteredSource, SourceRegistry};
