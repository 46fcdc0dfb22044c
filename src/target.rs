// src/target.rs

/// A single unit of build work.
///
/// A target is a passive value: a unique name, the input files its command
/// reads, the output files it produces, an opaque shell command, and the
/// names of targets that must finish before it may run. Construction is
/// builder-style; once inside a [`crate::dag::Dag`] a target is never
/// mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    command: String,
    dependencies: Vec<String>,
    signature: Option<String>,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<String>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<String>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Attach a signature computed by whoever created this target. The
    /// engine does not read it; it is kept so parsed targets round-trip.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input file paths, in declared order. Order matters for signatures.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Names of targets this one requires, in declared order. Self
    /// references and unknown names are legal here; the DAG detects them.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn set_command(&mut self, command: impl Into<String>) {
        self.command = command.into();
    }

    pub fn push_input(&mut self, input: impl Into<String>) {
        self.inputs.push(input.into());
    }

    pub fn push_output(&mut self, output: impl Into<String>) {
        self.outputs.push(output.into());
    }

    pub fn push_dependency(&mut self, dependency: impl Into<String>) {
        self.dependencies.push(dependency.into());
    }

    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }

    pub fn has_inputs(&self) -> bool {
        !self.inputs.is_empty()
    }

    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }
}
