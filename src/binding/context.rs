//! Binding contexts
//!
//! A binding context is anything a texture or its resolution can be written
//! into so later GPU work can read it. Three kinds exist:
//!
//! - [`MaterialPropertyBlock`]: per-draw material overrides
//! - [`ComputeDispatch`]: per-kernel bindings of a compute shader
//! - [`CommandRecorder`]: global bindings recorded into a command stream
//!
//! [`BindTarget`] selects one of them for a single bind call.

use glam::{UVec3, Vec4};
use rustc_hash::FxHashMap;

use crate::binding::PropertyId;
use crate::resources::{compute_groups_3d, TextureBinding};

/// A value written into a binding context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundValue {
    Texture(TextureBinding),
    Vector(Vec4),
}

impl BoundValue {
    pub fn as_texture(&self) -> Option<TextureBinding> {
        match self {
            BoundValue::Texture(binding) => Some(*binding),
            BoundValue::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec4> {
        match self {
            BoundValue::Texture(_) => None,
            BoundValue::Vector(v) => Some(*v),
        }
    }
}

/// Material property overrides keyed by variable.
#[derive(Debug, Clone, Default)]
pub struct MaterialPropertyBlock {
    values: FxHashMap<PropertyId, BoundValue>,
}

impl MaterialPropertyBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_texture(&mut self, variable: PropertyId, binding: TextureBinding) {
        self.values.insert(variable, BoundValue::Texture(binding));
    }

    pub fn set_vector(&mut self, variable: PropertyId, value: Vec4) {
        self.values.insert(variable, BoundValue::Vector(value));
    }

    pub fn get(&self, variable: PropertyId) -> Option<&BoundValue> {
        self.values.get(&variable)
    }

    pub fn texture(&self, variable: PropertyId) -> Option<TextureBinding> {
        self.get(variable).and_then(BoundValue::as_texture)
    }

    pub fn vector(&self, variable: PropertyId) -> Option<Vec4> {
        self.get(variable).and_then(BoundValue::as_vector)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Index of a kernel within a compute shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelIndex(pub u32);

/// A recorded dispatch of one kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchRecord {
    pub kernel: KernelIndex,
    pub groups: UVec3,
}

/// Bindings and dispatches of a compute shader, per kernel.
#[derive(Debug, Clone, Default)]
pub struct ComputeDispatch {
    label: String,
    kernels: FxHashMap<KernelIndex, FxHashMap<PropertyId, BoundValue>>,
    dispatches: Vec<DispatchRecord>,
}

impl ComputeDispatch {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_texture(
        &mut self,
        kernel: KernelIndex,
        variable: PropertyId,
        binding: TextureBinding,
    ) {
        self.kernels
            .entry(kernel)
            .or_default()
            .insert(variable, BoundValue::Texture(binding));
    }

    pub fn set_vector(&mut self, kernel: KernelIndex, variable: PropertyId, value: Vec4) {
        self.kernels
            .entry(kernel)
            .or_default()
            .insert(variable, BoundValue::Vector(value));
    }

    pub fn get(&self, kernel: KernelIndex, variable: PropertyId) -> Option<&BoundValue> {
        self.kernels.get(&kernel)?.get(&variable)
    }

    pub fn texture(&self, kernel: KernelIndex, variable: PropertyId) -> Option<TextureBinding> {
        self.get(kernel, variable).and_then(BoundValue::as_texture)
    }

    pub fn vector(&self, kernel: KernelIndex, variable: PropertyId) -> Option<Vec4> {
        self.get(kernel, variable).and_then(BoundValue::as_vector)
    }

    /// Record a dispatch covering `domain` with groups of `threads_per_group`.
    pub fn dispatch_over(
        &mut self,
        kernel: KernelIndex,
        domain: UVec3,
        threads_per_group: UVec3,
    ) -> DispatchRecord {
        let record = DispatchRecord {
            kernel,
            groups: compute_groups_3d(domain, threads_per_group),
        };
        log::trace!(
            "{}: dispatch kernel {} with {} groups",
            self.label,
            kernel.0,
            record.groups
        );
        self.dispatches.push(record);
        record
    }

    pub fn dispatches(&self) -> &[DispatchRecord] {
        &self.dispatches
    }
}

/// A command recorded by [`CommandRecorder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordedCommand {
    SetGlobalTexture {
        variable: PropertyId,
        binding: TextureBinding,
    },
    SetGlobalVector {
        variable: PropertyId,
        value: Vec4,
    },
}

/// Ordered stream of global binding commands.
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    label: String,
    commands: Vec<RecordedCommand>,
}

impl CommandRecorder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_global_texture(&mut self, variable: PropertyId, binding: TextureBinding) {
        self.commands
            .push(RecordedCommand::SetGlobalTexture { variable, binding });
    }

    pub fn set_global_vector(&mut self, variable: PropertyId, value: Vec4) {
        self.commands
            .push(RecordedCommand::SetGlobalVector { variable, value });
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Texture the command stream leaves bound to `variable`.
    pub fn global_texture(&self, variable: PropertyId) -> Option<TextureBinding> {
        self.commands.iter().rev().find_map(|command| match command {
            RecordedCommand::SetGlobalTexture { variable: v, binding } if *v == variable => {
                Some(*binding)
            }
            _ => None,
        })
    }

    /// Vector the command stream leaves bound to `variable`.
    pub fn global_vector(&self, variable: PropertyId) -> Option<Vec4> {
        self.commands.iter().rev().find_map(|command| match command {
            RecordedCommand::SetGlobalVector { variable: v, value } if *v == variable => {
                Some(*value)
            }
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Destination of a single bind call.
#[derive(Debug)]
pub enum BindTarget<'a> {
    Material(&'a mut MaterialPropertyBlock),
    Compute {
        dispatch: &'a mut ComputeDispatch,
        kernel: KernelIndex,
    },
    Commands(&'a mut CommandRecorder),
}

impl BindTarget<'_> {
    pub fn set_texture(&mut self, variable: PropertyId, binding: TextureBinding) {
        match self {
            BindTarget::Material(block) => block.set_texture(variable, binding),
            BindTarget::Compute { dispatch, kernel } => {
                dispatch.set_texture(*kernel, variable, binding)
            }
            BindTarget::Commands(recorder) => recorder.set_global_texture(variable, binding),
        }
    }

    pub fn set_vector(&mut self, variable: PropertyId, value: Vec4) {
        match self {
            BindTarget::Material(block) => block.set_vector(variable, value),
            BindTarget::Compute { dispatch, kernel } => {
                dispatch.set_vector(*kernel, variable, value)
            }
            BindTarget::Commands(recorder) => recorder.set_global_vector(variable, value),
        }
    }
}
