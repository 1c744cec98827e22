//! AST to GLSL generator
//!
//! Walks a [`Program`] and fills two buffers: a raymarching fragment shader
//! and a compute shader that samples the scene distance on a voxel grid.
//! Everything except the two entry points (and the camera/background, which
//! only the fragment shader uses) is written to both buffers in lockstep.
//!
//! Shapes are emitted as `SceneResult sdN = sdfl_builtin_<shape>(frame, ...);`
//! and then merged into the running scene result with `sdfl_PushScene`,
//! unless they feed a boolean operation, in which case only the combined
//! result is merged.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use sdfl_lang::{CompilationContext, Expression, FunctionCall, Location, Phase, Program, SymbolRole};

use crate::buffers::{GeneratedShaders, ShaderBuffers};
use crate::error::{GenerateError, Result};
use crate::library::{self, MaterialId};
use crate::options::GeneratorOptions;

/// Progress of a generation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStage {
    #[default]
    Reset,
    HeaderEmitted,
    PrimitivesEmitted,
    UserFunctions,
    SceneBegin,
    SceneChildren,
    SceneEnd,
    RaymarchEmitted,
    FragmentMainEmitted,
    ComputeMainEmitted,
    Done,
    /// Root scene validation failed; no entry points were emitted
    Failed,
}

/// Dual-target GLSL generator
#[derive(Debug, Clone, Default)]
pub struct GlslGenerator {
    options: GeneratorOptions,
    buffers: ShaderBuffers,
    stage: GenerationStage,
}

/// Validated pieces of the root `scene(...)` call
struct SceneSpec<'p> {
    camera_position: &'p [String],
    background: Option<&'p [String]>,
    children: &'p [Expression],
}

impl GlslGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            buffers: ShaderBuffers::new(),
            stage: GenerationStage::Reset,
        }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn stage(&self) -> GenerationStage {
        self.stage
    }

    /// The accumulators, including partial output after a failed pass
    pub fn buffers(&self) -> &ShaderBuffers {
        &self.buffers
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
        self.stage = GenerationStage::Reset;
    }

    fn enter(&mut self, stage: GenerationStage) {
        tracing::debug!("Generation stage: {:?}", stage);
        self.stage = stage;
    }

    /// Run one full pass. The buffers and the context's fresh-name counters
    /// are reset first, so repeated passes over the same AST are identical.
    ///
    /// Problems inside the scene tree are reported to `ctx.diagnostics` and
    /// do not stop the pass; a malformed root `scene` call does.
    pub fn generate(
        &mut self,
        program: &Program,
        ctx: &mut CompilationContext,
    ) -> Result<GeneratedShaders> {
        self.reset();
        ctx.reset_names();

        let defines = library::defines(&self.options);
        self.buffers.fragment(library::FRAGMENT_HEADER);
        self.buffers.fragment(&defines);
        self.buffers.compute(library::COMPUTE_HEADER);
        self.buffers.compute(&defines);
        self.buffers.both(library::TYPES);
        self.enter(GenerationStage::HeaderEmitted);

        self.buffers.both(library::PRIMITIVES);
        self.buffers
            .both(&library::material_lookup(&self.options.materials));
        self.enter(GenerationStage::PrimitivesEmitted);

        let scene = match validate_scene(&program.root) {
            Ok(scene) => scene,
            Err(error) => {
                if let GenerateError::InvalidScene { path, reason } = &error {
                    ctx.diagnostics
                        .error(Phase::Generation, Location::Path(path.clone()), reason.clone());
                }
                self.enter(GenerationStage::Failed);
                return Err(error);
            }
        };

        self.enter(GenerationStage::UserFunctions);
        let mut emitter = Emitter {
            buffers: &mut self.buffers,
            ctx: &mut *ctx,
            current_function: None,
            cycles: BTreeMap::new(),
        };
        emitter.user_functions();

        self.enter(GenerationStage::SceneBegin);
        self.buffers.both(library::SCENE_BEGIN);

        self.enter(GenerationStage::SceneChildren);
        let mut emitter = Emitter {
            buffers: &mut self.buffers,
            ctx: &mut *ctx,
            current_function: None,
            cycles: BTreeMap::new(),
        };
        for (i, child) in scene.children.iter().enumerate() {
            emitter.node(child, "p", Some(Sink::Scene), &format!("scene.children[{}]", i));
        }

        self.enter(GenerationStage::SceneEnd);
        self.buffers.both(library::SCENE_END);

        self.buffers.both(library::RAYMARCH);
        self.enter(GenerationStage::RaymarchEmitted);

        let ray_origin = tuple_value(scene.camera_position, "scene.camera.camera.position", ctx);
        let background = match scene.background {
            Some(values) => tuple_value(values, "scene.background", ctx),
            None => library::vec3(self.options.background),
        };
        self.buffers
            .fragment(&library::fragment_main(&ray_origin, &background));
        self.enter(GenerationStage::FragmentMainEmitted);

        self.buffers.compute(library::COMPUTE_MAIN);
        self.enter(GenerationStage::ComputeMainEmitted);

        self.enter(GenerationStage::Done);
        tracing::info!(
            "Generated shaders ({} fragment bytes, {} compute bytes)",
            self.buffers.fragment_text().len(),
            self.buffers.compute_text().len()
        );
        Ok(self.buffers.snapshot())
    }
}

/// Generate with default options
pub fn generate(program: &Program, ctx: &mut CompilationContext) -> Result<GeneratedShaders> {
    GlslGenerator::default().generate(program, ctx)
}

fn invalid_scene(path: &str, reason: impl Into<String>) -> GenerateError {
    GenerateError::InvalidScene {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn validate_scene(root: &Expression) -> Result<SceneSpec<'_>> {
    let scene = root
        .as_call()
        .filter(|call| call.identifier == "scene")
        .ok_or_else(|| {
            invalid_scene(
                "root",
                format!("the root expression must be a `scene(...)` call, found {}", root.describe()),
            )
        })?;

    let camera = scene
        .argument("camera")
        .ok_or_else(|| invalid_scene("scene", "missing required argument `camera`"))?;
    let camera = camera
        .as_call()
        .filter(|call| call.identifier == "camera")
        .ok_or_else(|| invalid_scene("scene.camera", "`camera` must be a `camera(...)` call"))?;
    let camera_position = camera
        .argument("position")
        .ok_or_else(|| invalid_scene("scene.camera.camera", "missing required argument `position`"))?
        .as_tuple()
        .ok_or_else(|| invalid_scene("scene.camera.camera.position", "camera position must be a tuple"))?;

    let children = scene
        .argument("children")
        .ok_or_else(|| invalid_scene("scene", "missing required argument `children`"))?
        .as_array()
        .ok_or_else(|| invalid_scene("scene.children", "`children` must be an array"))?;

    let background = match scene.argument("background") {
        Some(expr) => Some(
            expr.as_tuple()
                .ok_or_else(|| invalid_scene("scene.background", "background must be a tuple"))?,
        ),
        None => None,
    };

    Ok(SceneSpec {
        camera_position,
        background,
        children,
    })
}

/// Where a generated shape result goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    /// Merge into the running scene result
    Scene,
    /// Fold into the local `d` of a user function
    Distance,
}

struct Emitter<'g> {
    buffers: &'g mut ShaderBuffers,
    ctx: &'g mut CompilationContext,
    current_function: Option<String>,
    /// Call chain back to itself for every user function that recurses
    cycles: BTreeMap<String, Vec<String>>,
}

impl Emitter<'_> {
    fn error(&mut self, path: &str, message: impl Into<String>) {
        self.ctx
            .diagnostics
            .error(Phase::Generation, Location::Path(path.to_string()), message);
    }

    fn warning(&mut self, path: &str, message: impl Into<String>) {
        self.ctx
            .diagnostics
            .warning(Phase::Generation, Location::Path(path.to_string()), message);
    }

    fn line(&mut self, code: &str) {
        self.buffers.both(code);
    }

    fn sink(&mut self, var: &str, sink: Option<Sink>) {
        match sink {
            Some(Sink::Scene) => self.line(&format!("    sdfl_PushScene({});\n", var)),
            Some(Sink::Distance) => self.line(&format!("    d = min(d, {}.dist);\n", var)),
            None => {}
        }
    }

    fn user_functions(&mut self) {
        let functions: Vec<(String, Option<Expression>)> = self
            .ctx
            .symbols
            .user_defined()
            .into_iter()
            .map(|s| (s.identifier.clone(), s.body.clone()))
            .collect();
        if functions.is_empty() {
            return;
        }
        self.cycles = call_cycles(&functions);

        self.line("\n// user-defined functions\n");
        for (identifier, _) in &functions {
            self.line(&format!("float sdfl_user_{}(vec3 p);\n", identifier));
        }
        for (identifier, body) in &functions {
            self.user_function(identifier, body.as_ref());
        }
    }

    /// `float sdfl_user_<id>(vec3 p)` returning the nearest child distance.
    /// Material ids are not carried out of user functions.
    fn user_function(&mut self, identifier: &str, body: Option<&Expression>) {
        self.line(&format!(
            "\nfloat sdfl_user_{}(vec3 p) {{\n    float d = SDFL_MAX_DISTANCE;\n",
            identifier
        ));
        self.current_function = Some(identifier.to_string());

        let children = body
            .and_then(Expression::as_call)
            .filter(|call| call.identifier == "local")
            .and_then(|call| call.argument("children"))
            .and_then(Expression::as_array);
        match children {
            Some(children) => {
                for (i, child) in children.iter().enumerate() {
                    let path = format!("{}.local.children[{}]", identifier, i);
                    self.node(child, "p", Some(Sink::Distance), &path);
                }
            }
            None => self.error(
                identifier,
                format!(
                    "the body of `{}` must be a `local(children: [...])` call",
                    identifier
                ),
            ),
        }

        self.current_function = None;
        self.line("    return d;\n}\n");
    }

    /// Emit a shape-producing expression. Returns the variable holding its
    /// `SceneResult`, if one was produced.
    fn node(
        &mut self,
        expr: &Expression,
        frame: &str,
        sink: Option<Sink>,
        path: &str,
    ) -> Option<String> {
        match expr.ungrouped() {
            Expression::Call(call) => self.call(call, frame, sink, path),
            Expression::Array(items) => {
                if sink.is_none() {
                    self.error(path, "an array cannot be used where a single shape is expected");
                    return None;
                }
                for (i, item) in items.iter().enumerate() {
                    self.node(item, frame, sink, &format!("{}[{}]", path, i));
                }
                None
            }
            other => {
                self.error(
                    path,
                    format!("expected a shape, found a {}", other.describe()),
                );
                None
            }
        }
    }

    fn call(
        &mut self,
        call: &FunctionCall,
        frame: &str,
        sink: Option<Sink>,
        path: &str,
    ) -> Option<String> {
        let here = format!("{}.{}", path, call.identifier);
        let Some(signature) = self.ctx.symbols.lookup(&call.identifier) else {
            self.error(
                &here,
                format!("call to unknown function `{}`", call.identifier),
            );
            return None;
        };
        let role = signature.role;
        let parameters = signature.parameters.clone();

        for name in call.arguments.keys() {
            if !parameters.contains(name) {
                self.warning(
                    &here,
                    format!("`{}` has no parameter named `{}`", call.identifier, name),
                );
            }
        }

        match role {
            SymbolRole::PrimitiveShape => self.shape(call, &parameters, frame, sink, &here),
            SymbolRole::BooleanOp => self.boolean(call, frame, sink, &here),
            SymbolRole::Transform => self.rotate_around(call, frame, sink, &here),
            SymbolRole::LocalScope => self.local(call, frame, sink, &here),
            SymbolRole::UserDefined => self.user_call(call, frame, sink, &here),
            SymbolRole::Scene => {
                self.error(&here, "`scene` can only be the root expression");
                None
            }
            SymbolRole::Camera => {
                self.error(&here, "`camera` can only be used as the scene camera");
                None
            }
            SymbolRole::BuiltinVariable | SymbolRole::UserVariable => {
                self.error(&here, "variables are not supported");
                None
            }
        }
    }

    fn required<'e>(&mut self, call: &'e FunctionCall, name: &str, path: &str) -> Option<&'e Expression> {
        let argument = call.argument(name);
        if argument.is_none() {
            self.error(
                path,
                format!("`{}` is missing required argument `{}`", call.identifier, name),
            );
        }
        argument
    }

    fn shape(
        &mut self,
        call: &FunctionCall,
        parameters: &[String],
        frame: &str,
        sink: Option<Sink>,
        path: &str,
    ) -> Option<String> {
        let mut args = vec![frame.to_string()];
        for name in parameters {
            if let Some(value) = self.required(call, name, path) {
                let rendered = self.value(value, &format!("{}.{}", path, name));
                args.push(rendered);
            }
        }

        let var = self.ctx.fresh_name("sd");
        self.line(&format!(
            "    SceneResult {} = sdfl_builtin_{}({});\n",
            var,
            call.identifier,
            args.join(", ")
        ));
        self.sink(&var, sink);
        Some(var)
    }

    /// Both children are generated in the current frame without merging;
    /// only the combined result reaches the sink.
    fn boolean(
        &mut self,
        call: &FunctionCall,
        frame: &str,
        sink: Option<Sink>,
        path: &str,
    ) -> Option<String> {
        let child1 = self.required(call, "child1", path);
        let child2 = self.required(call, "child2", path);
        let a = child1.and_then(|c| self.node(c, frame, None, &format!("{}.child1", path)));
        let b = child2.and_then(|c| self.node(c, frame, None, &format!("{}.child2", path)));

        let mut args = vec![a?, b?];
        if call.identifier.starts_with("smooth") {
            let k = self.required(call, "smooth_transition", path)?;
            args.push(self.value(k, &format!("{}.smooth_transition", path)));
        }

        let var = self.ctx.fresh_name("sd");
        self.line(&format!(
            "    SceneResult {} = sdfl_builtin_{}({});\n",
            var,
            call.identifier,
            args.join(", ")
        ));
        self.sink(&var, sink);
        Some(var)
    }

    /// Pivot-subtract, rotate, pivot-add into a fresh frame derived from the
    /// current one, then generate the child in that frame.
    fn rotate_around(
        &mut self,
        call: &FunctionCall,
        frame: &str,
        sink: Option<Sink>,
        path: &str,
    ) -> Option<String> {
        let position = self.required(call, "position", path);
        let rotation = self.required(call, "rotation", path);
        let child = self.required(call, "child", path);
        let (position, rotation, child) = (position?, rotation?, child?);

        let pivot = self.value(position, &format!("{}.position", path));
        let angles = self.value(rotation, &format!("{}.rotation", path));

        let q = self.ctx.fresh_name("q");
        self.line(&format!("    vec3 {} = {} - {};\n", q, frame, pivot));
        self.line(&format!(
            "    {} = sdfl_RotationMatrix(radians({})) * {};\n",
            q, angles, q
        ));
        self.line(&format!("    {} += {};\n", q, pivot));

        self.node(child, &q, sink, &format!("{}.child", path))
    }

    /// With a sink, every child merges on its own. Without one (inside a
    /// boolean operation) the children are unioned into a single result.
    fn local(
        &mut self,
        call: &FunctionCall,
        frame: &str,
        sink: Option<Sink>,
        path: &str,
    ) -> Option<String> {
        let children = self.required(call, "children", path)?;
        let Some(items) = children.as_array() else {
            self.error(path, "`children` must be an array");
            return None;
        };

        if sink.is_some() {
            for (i, item) in items.iter().enumerate() {
                self.node(item, frame, sink, &format!("{}.children[{}]", path, i));
            }
            return None;
        }

        let mut results = Vec::new();
        for (i, item) in items.iter().enumerate() {
            if let Some(var) = self.node(item, frame, None, &format!("{}.children[{}]", path, i)) {
                results.push(var);
            }
        }
        let mut results = results.into_iter();
        let mut combined = results.next()?;
        for next in results {
            let var = self.ctx.fresh_name("sd");
            self.line(&format!(
                "    SceneResult {} = sdfl_builtin_union({}, {});\n",
                var, combined, next
            ));
            combined = var;
        }
        Some(combined)
    }

    fn user_call(
        &mut self,
        call: &FunctionCall,
        frame: &str,
        sink: Option<Sink>,
        path: &str,
    ) -> Option<String> {
        let closes_cycle = self
            .current_function
            .as_ref()
            .filter(|current| self.cycles.contains_key(current.as_str()))
            .and_then(|_| self.cycles.get(&call.identifier));
        if let Some(chain) = closes_cycle {
            let message = if chain.len() <= 2 {
                format!("`{}` calls itself; recursion is not supported", call.identifier)
            } else {
                format!(
                    "`{}` is part of the call cycle {}; recursion is not supported",
                    call.identifier,
                    chain.join(" -> ")
                )
            };
            self.error(path, message);
            return None;
        }

        let var = self.ctx.fresh_name("sd");
        self.line(&format!(
            "    SceneResult {} = SceneResult(sdfl_user_{}({}), {});\n",
            var,
            call.identifier,
            frame,
            MaterialId::User.define()
        ));
        self.sink(&var, sink);
        Some(var)
    }

    /// Render a value expression as GLSL text
    fn value(&mut self, expr: &Expression, path: &str) -> String {
        match expr {
            Expression::Number(text) => text.clone(),
            Expression::Tuple(values) => tuple_value(values, path, self.ctx),
            Expression::Binary(binary) => {
                let left = self.value(&binary.left, path);
                let right = self.value(&binary.right, path);
                format!("({} {} {})", left, binary.operator.symbol(), right)
            }
            Expression::Grouped(inner) => self.value(inner, path),
            other => {
                self.error(
                    path,
                    format!("expected a number or tuple, found a {}", other.describe()),
                );
                "0.0".to_string()
            }
        }
    }
}

/// `vec3(...)` for a tuple. One component splats; a missing third component
/// is reported and padded.
/// Find the user functions that can call back into themselves, directly or
/// through other user functions
fn call_cycles(functions: &[(String, Option<Expression>)]) -> BTreeMap<String, Vec<String>> {
    let names: BTreeSet<&str> = functions.iter().map(|(id, _)| id.as_str()).collect();
    let graph: BTreeMap<&str, BTreeSet<&str>> = functions
        .iter()
        .map(|(id, body)| {
            let mut callees = BTreeSet::new();
            if let Some(body) = body {
                collect_calls(body, &names, &mut callees);
            }
            (id.as_str(), callees)
        })
        .collect();

    graph
        .keys()
        .filter_map(|&start| cycle_through(&graph, start).map(|chain| (start.to_string(), chain)))
        .collect()
}

fn collect_calls<'e>(expr: &'e Expression, names: &BTreeSet<&str>, out: &mut BTreeSet<&'e str>) {
    match expr {
        Expression::Call(call) => {
            if names.contains(call.identifier.as_str()) {
                out.insert(call.identifier.as_str());
            }
            for argument in call.arguments.values() {
                collect_calls(argument, names, out);
            }
        }
        Expression::Array(items) => {
            for item in items {
                collect_calls(item, names, out);
            }
        }
        Expression::Binary(operation) => {
            collect_calls(&operation.left, names, out);
            collect_calls(&operation.right, names, out);
        }
        Expression::Grouped(inner) => collect_calls(inner, names, out),
        Expression::Number(_) | Expression::Tuple(_) | Expression::Invalid => {}
    }
}

/// Shortest call chain from `start` back to itself, e.g. `a -> b -> a`
fn cycle_through<'a>(
    graph: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    start: &'a str,
) -> Option<Vec<String>> {
    let mut parents: BTreeMap<&str, &str> = BTreeMap::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        for &next in graph.get(node).into_iter().flatten() {
            if next == start {
                let mut back = Vec::new();
                let mut current = node;
                while current != start {
                    back.push(current);
                    match parents.get(current) {
                        Some(&parent) => current = parent,
                        None => break,
                    }
                }
                let chain = std::iter::once(start)
                    .chain(back.into_iter().rev())
                    .chain(std::iter::once(start))
                    .map(str::to_string)
                    .collect();
                return Some(chain);
            }
            if !parents.contains_key(next) {
                parents.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    None
}

fn tuple_value(values: &[String], path: &str, ctx: &mut CompilationContext) -> String {
    let mut report = |message: String| {
        ctx.diagnostics
            .error(Phase::Generation, Location::Path(path.to_string()), message);
    };
    match values {
        [] => {
            report("empty tuple".to_string());
            "vec3(0.0)".to_string()
        }
        [v] => format!("vec3({})", v),
        [x, y] => {
            report(format!("tuple ({}, {}) has two components; expected one or three", x, y));
            format!("vec3({}, {}, 0.0)", x, y)
        }
        [x, y, z] => format!("vec3({}, {}, {})", x, y, z),
        [x, y, z, ..] => {
            report(format!("tuple has {} components; only the first three are used", values.len()));
            format!("vec3({}, {}, {})", x, y, z)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sdfl_lang::parse_source;

    fn scene_with(children: &str) -> String {
        format!(
            "scene(camera: camera(position: (0, 1, 5)), children: [{}])",
            children
        )
    }

    fn compile(source: &str) -> (Result<GeneratedShaders>, CompilationContext) {
        let mut ctx = CompilationContext::new();
        let program = parse_source(source, &mut ctx).unwrap();
        let result = generate(&program, &mut ctx);
        (result, ctx)
    }

    #[test]
    fn test_sphere_is_pushed_into_scene() {
        let (shaders, ctx) = compile(&scene_with("sphere(position: (0, 0, 0), radius: 1.0)"));
        let shaders = shaders.unwrap();
        for text in [&shaders.fragment, &shaders.compute] {
            assert!(text.contains("    SceneResult sd0 = sdfl_builtin_sphere(p, vec3(0, 0, 0), 1.0);\n"));
            assert!(text.contains("    sdfl_PushScene(sd0);\n"));
        }
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_children_aborts_without_main() {
        let mut ctx = CompilationContext::new();
        let program = parse_source("scene(camera: camera(position: (0, 1, 5)))", &mut ctx).unwrap();
        let mut generator = GlslGenerator::default();
        let err = generator.generate(&program, &mut ctx).unwrap_err();

        assert!(matches!(err, GenerateError::InvalidScene { .. }));
        assert_eq!(generator.stage(), GenerationStage::Failed);
        assert!(!generator.buffers().fragment_text().contains("main("));
        assert!(!generator.buffers().compute_text().contains("main("));
        assert!(generator.buffers().fragment_text().contains("sdfl_builtin_sphere"));
        assert!(ctx.diagnostics.has_errors_in(Phase::Generation));
    }

    #[test]
    fn test_root_must_be_scene() {
        let (result, _) = compile("sphere(radius: 1)");
        assert!(matches!(
            result,
            Err(GenerateError::InvalidScene { ref path, .. }) if path == "root"
        ));
    }

    #[test]
    fn test_smooth_union_merges_once() {
        let (shaders, _) = compile(&scene_with(
            "smoothUnion(child1: sphere(position: (0, 0, 0), radius: 1), child2: box(position: (1, 0, 0), size: (0.5, 0.5, 0.5)), smooth_transition: 0.2)",
        ));
        let shaders = shaders.unwrap();
        assert_eq!(shaders.fragment.matches("sdfl_PushScene(sd").count(), 1);
        assert_eq!(shaders.compute.matches("sdfl_PushScene(sd").count(), 1);
        assert!(shaders
            .fragment
            .contains("    SceneResult sd2 = sdfl_builtin_smoothUnion(sd0, sd1, 0.2);\n    sdfl_PushScene(sd2);\n"));
    }

    #[test]
    fn test_nested_transforms_use_current_frame() {
        let (shaders, _) = compile(&scene_with(
            "rotateAround(position: (0, 1, 0), rotation: (0, 45, 0), child: rotateAround(position: (1, 0, 0), rotation: (90, 0, 0), child: box(position: (0, 0, 0), size: (1, 1, 1))))",
        ));
        let fragment = shaders.unwrap().fragment;
        assert!(fragment.contains("    vec3 q0 = p - vec3(0, 1, 0);\n"));
        assert!(fragment.contains("    q0 = sdfl_RotationMatrix(radians(vec3(0, 45, 0))) * q0;\n"));
        assert!(fragment.contains("    vec3 q1 = q0 - vec3(1, 0, 0);\n"));
        assert!(fragment.contains("sdfl_builtin_box(q1, "));
        assert_eq!(fragment.matches("sdfl_PushScene(sd").count(), 1);
    }

    #[test]
    fn test_user_function_is_declared_and_called() {
        let source = format!(
            "def pair(gap) {{ local(children: [sphere(position: (0, 0, 0), radius: 1), torus(position: (0, 0, 0), radius: 2, thickness: 0.1)]) }}\n{}",
            scene_with("pair(gap: 1)")
        );
        let (shaders, ctx) = compile(&source);
        let fragment = shaders.unwrap().fragment;
        assert!(fragment.contains("float sdfl_user_pair(vec3 p);\n"));
        assert!(fragment.contains("float sdfl_user_pair(vec3 p) {\n    float d = SDFL_MAX_DISTANCE;\n"));
        assert!(fragment.contains("    d = min(d, sd0.dist);\n"));
        assert!(fragment.contains("SceneResult(sdfl_user_pair(p), SDFL_MATERIAL_USER);"));
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_call_is_reported_not_fatal() {
        let (shaders, ctx) = compile(&scene_with("cylinder(radius: 1), sphere(radius: 1, position: (0, 0, 0))"));
        assert!(shaders.is_ok());
        let errors = ctx.diagnostics.errors_in(Phase::Generation);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].location,
            Location::Path("scene.children[0].cylinder".into())
        );
    }

    #[test]
    fn test_missing_argument_is_reported_and_generation_continues() {
        let (shaders, ctx) = compile(&scene_with("smoothUnion(child1: sphere(position: (0, 0, 0)), child2: plane(height: 0), smooth_transition: 0.1)"));
        let fragment = shaders.unwrap().fragment;
        assert!(fragment.contains("sdfl_builtin_sphere(p, vec3(0, 0, 0));"));
        let errors = ctx.diagnostics.errors_in(Phase::Generation);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].location,
            Location::Path("scene.children[0].smoothUnion.child1.sphere".into())
        );
    }

    #[test]
    fn test_values_render_with_explicit_parentheses() {
        let (shaders, _) = compile(&scene_with("sphere(position: (2,), radius: (1 + 2) * 0.5)"));
        let fragment = shaders.unwrap().fragment;
        assert!(fragment.contains("sdfl_builtin_sphere(p, vec3(2), ((1 + 2) * 0.5));"));
    }

    #[test]
    fn test_two_component_tuple_is_padded_and_reported() {
        let (shaders, ctx) = compile(&scene_with("sphere(position: (1, 2), radius: 1)"));
        assert!(shaders.unwrap().fragment.contains("vec3(1, 2, 0.0)"));
        assert!(ctx.diagnostics.has_errors_in(Phase::Generation));
    }

    #[test]
    fn test_camera_and_background_are_fragment_only() {
        let source = "scene(background: (0.1, 0.1, 0.2), camera: camera(position: (0, 1, 5)), children: [plane(height: -1)])";
        let shaders = compile(source).0.unwrap();
        assert!(shaders.fragment.contains("vec3 ray_origin = vec3(0, 1, 5);"));
        assert!(shaders.fragment.contains("vec3 background = vec3(0.1, 0.1, 0.2);"));
        assert!(!shaders.compute.contains("vec3(0, 1, 5)"));
        assert!(shaders.compute.contains("sdfData[index] = d;"));

        let defaulted = compile(&scene_with("plane(height: -1)")).0.unwrap();
        assert!(defaulted.fragment.contains("vec3 background = vec3(0.7, 0.8, 0.9);"));
    }

    #[test]
    fn test_generation_is_idempotent() {
        let mut ctx = CompilationContext::new();
        let program = parse_source(
            &scene_with("union(child1: sphere(position: (0, 0, 0), radius: 1), child2: box(position: (0, 0, 0), size: (1, 1, 1)))"),
            &mut ctx,
        )
        .unwrap();
        let mut generator = GlslGenerator::default();
        let first = generator.generate(&program, &mut ctx).unwrap();
        let second = generator.generate(&program, &mut ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(generator.stage(), GenerationStage::Done);
    }

    #[test]
    fn test_local_inside_boolean_is_unioned() {
        let (shaders, _) = compile(&scene_with(
            "subtraction(child1: local(children: [sphere(position: (0, 0, 0), radius: 1), sphere(position: (1, 0, 0), radius: 1)]), child2: box(position: (0, 0, 0), size: (2, 2, 2)))",
        ));
        let fragment = shaders.unwrap().fragment;
        assert!(fragment.contains("    SceneResult sd2 = sdfl_builtin_union(sd0, sd1);\n"));
        assert!(fragment.contains("sdfl_builtin_subtraction(sd2, sd3)"));
    }

    #[test]
    fn test_recursive_user_function_is_rejected() {
        let source = format!(
            "def loop() {{ local(children: [loop()]) }}\n{}",
            scene_with("loop()")
        );
        let (shaders, ctx) = compile(&source);
        assert!(shaders.is_ok());
        assert!(
            ctx.diagnostics
                .iter()
                .any(|d| d.message.contains("recursion"))
        );
    }

    #[test]
    fn test_mutual_recursion_is_rejected() {
        let source = format!(
            "def a() {{ local(children: [b()]) }}\ndef b() {{ local(children: [a()]) }}\n{}",
            scene_with("a()")
        );
        let (shaders, ctx) = compile(&source);
        let shaders = shaders.unwrap();
        let messages: Vec<&str> = ctx
            .diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.contains("a -> b -> a")));
        assert!(messages.iter().any(|m| m.contains("b -> a -> b")));
        for text in [&shaders.fragment, &shaders.compute] {
            assert!(!text.contains("sdfl_user_b(p)"));
        }
        assert!(shaders.fragment.contains("sdfl_user_a(p)"));
    }

    #[test]
    fn test_call_chain_without_cycle_is_kept() {
        let source = format!(
            "def leaf() {{ local(children: [sphere(position: (0, 0, 0), radius: 1)]) }}\n\
             def stem() {{ local(children: [leaf()]) }}\n{}",
            scene_with("stem()")
        );
        let (shaders, ctx) = compile(&source);
        let shaders = shaders.unwrap();
        assert!(!ctx.diagnostics.iter().any(|d| d.message.contains("recursion")));
        assert!(shaders.fragment.contains("sdfl_user_leaf(p)"));
        assert!(shaders.fragment.contains("sdfl_user_stem(p)"));
    }
}
