//! GLSL interface extraction
//!
//! Reads the global declarations of a shader pair: struct types, uniforms and
//! stage inputs/outputs. Function bodies are skipped. This is enough to give
//! [`HeadlessContext`](super::HeadlessContext) the same name-based view of a
//! program that a driver exposes through uniform and attribute queries, and to
//! reject sources a driver would reject for structural reasons.

use std::collections::HashMap;
use std::fmt;

use super::{GpuError, GpuResult};

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Type of a declared variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlslType {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// `sampler2D`
    Sampler2D,
    /// User-defined struct
    Struct(String),
}

impl GlslType {
    fn builtin(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "mat3" => Self::Mat3,
            "mat4" => Self::Mat4,
            "sampler2D" => Self::Sampler2D,
            _ => return None,
        })
    }
}

/// Linked interface of a vertex/fragment pair
///
/// Struct uniforms are flattened to `name.member` entries, the way a driver
/// reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    /// Uniforms in declaration order
    pub uniforms: Vec<(String, GlslType)>,
    /// Vertex stage inputs in declaration order
    pub attributes: Vec<(String, GlslType)>,
}

impl ShaderInterface {
    /// Parse and link a vertex/fragment pair
    pub fn link(vertex_source: &str, fragment_source: &str) -> GpuResult<Self> {
        let vertex = StageDeclarations::parse(vertex_source, ShaderStage::Vertex)?;
        let fragment = StageDeclarations::parse(fragment_source, ShaderStage::Fragment)?;

        for (name, ty) in &fragment.inputs {
            match vertex.outputs.iter().find(|(out, _)| out == name) {
                Some((_, out_ty)) if out_ty == ty => {}
                Some(_) => {
                    return Err(GpuError::ProgramLink(format!(
                        "type of varying '{name}' differs between stages"
                    )))
                }
                None => {
                    return Err(GpuError::ProgramLink(format!(
                        "fragment input '{name}' has no matching vertex output"
                    )))
                }
            }
        }

        let mut interface = Self {
            attributes: vertex.inputs.clone(),
            ..Self::default()
        };
        for stage in [&vertex, &fragment] {
            for (name, ty) in &stage.uniforms {
                interface.add_uniform(name, ty, stage)?;
            }
        }
        Ok(interface)
    }

    fn add_uniform(&mut self, name: &str, ty: &GlslType, stage: &StageDeclarations) -> GpuResult<()> {
        let mut flattened = Vec::new();
        match ty {
            GlslType::Struct(struct_name) => {
                let members = stage.structs.get(struct_name).ok_or_else(|| {
                    GpuError::ProgramLink(format!("unknown struct '{struct_name}'"))
                })?;
                for (member, member_ty) in members {
                    flattened.push((format!("{name}.{member}"), member_ty.clone()));
                }
            }
            _ => flattened.push((name.to_string(), ty.clone())),
        }

        for (flat_name, flat_ty) in flattened {
            match self.uniforms.iter().find(|(existing, _)| *existing == flat_name) {
                Some((_, existing_ty)) if *existing_ty != flat_ty => {
                    return Err(GpuError::ProgramLink(format!(
                        "uniform '{flat_name}' declared with different types"
                    )));
                }
                Some(_) => {}
                None => self.uniforms.push((flat_name, flat_ty)),
            }
        }
        Ok(())
    }

    /// Index of a uniform, used as its location
    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|(uniform, _)| uniform == name)
    }

    /// Index of a vertex input, used as its location
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|(attribute, _)| attribute == name)
    }
}

/// Global declarations of one stage
#[derive(Debug, Default)]
struct StageDeclarations {
    structs: HashMap<String, Vec<(String, GlslType)>>,
    uniforms: Vec<(String, GlslType)>,
    inputs: Vec<(String, GlslType)>,
    outputs: Vec<(String, GlslType)>,
}

impl StageDeclarations {
    fn parse(source: &str, stage: ShaderStage) -> GpuResult<Self> {
        let compile_error = |log: String| GpuError::ShaderCompilation { stage, log };
        let tokens = tokenize(&strip_comments_and_directives(source));

        let mut decls = Self::default();
        let mut has_main = false;
        let mut i = 0;

        while i < tokens.len() {
            match tokens[i].as_str() {
                "struct" => {
                    let name = tokens
                        .get(i + 1)
                        .filter(|t| is_identifier(t))
                        .ok_or_else(|| compile_error("struct without a name".into()))?
                        .clone();
                    if tokens.get(i + 2).map(String::as_str) != Some("{") {
                        return Err(compile_error(format!("expected '{{' after struct {name}")));
                    }
                    let mut members = Vec::new();
                    i += 3;
                    while tokens.get(i).map(String::as_str) != Some("}") {
                        let ty_token = tokens
                            .get(i)
                            .ok_or_else(|| compile_error(format!("unterminated struct {name}")))?;
                        let ty = decls.resolve_type(ty_token).ok_or_else(|| {
                            compile_error(format!("unknown type '{ty_token}' in struct {name}"))
                        })?;
                        let member = tokens
                            .get(i + 1)
                            .filter(|t| is_identifier(t))
                            .ok_or_else(|| compile_error(format!("malformed member in struct {name}")))?;
                        if tokens.get(i + 2).map(String::as_str) != Some(";") {
                            return Err(compile_error(format!("expected ';' after {name}.{member}")));
                        }
                        members.push((member.clone(), ty));
                        i += 3;
                    }
                    if tokens.get(i + 1).map(String::as_str) != Some(";") {
                        return Err(compile_error(format!("expected ';' after struct {name}")));
                    }
                    decls.structs.insert(name, members);
                    i += 2;
                }
                "uniform" | "in" | "out" | "attribute" | "varying" => {
                    let qualifier = tokens[i].clone();
                    let mut j = i + 1;
                    while matches!(
                        tokens.get(j).map(String::as_str),
                        Some("highp" | "mediump" | "lowp" | "flat" | "smooth")
                    ) {
                        j += 1;
                    }
                    let (Some(ty_token), Some(name)) = (tokens.get(j), tokens.get(j + 1)) else {
                        return Err(compile_error(format!("incomplete '{qualifier}' declaration")));
                    };
                    let ty = decls
                        .resolve_type(ty_token)
                        .ok_or_else(|| compile_error(format!("unknown type '{ty_token}'")))?;
                    if !is_identifier(name) || tokens.get(j + 2).map(String::as_str) != Some(";") {
                        return Err(compile_error(format!("malformed declaration of '{name}'")));
                    }
                    let entry = (name.clone(), ty);
                    match (qualifier.as_str(), stage) {
                        ("uniform", _) => decls.uniforms.push(entry),
                        ("in" | "attribute", ShaderStage::Vertex) => decls.inputs.push(entry),
                        ("varying", ShaderStage::Vertex) | ("out", ShaderStage::Vertex) => {
                            decls.outputs.push(entry);
                        }
                        ("in" | "varying", ShaderStage::Fragment) => decls.inputs.push(entry),
                        ("out", ShaderStage::Fragment) => decls.outputs.push(entry),
                        _ => {
                            return Err(compile_error(format!(
                                "'{qualifier}' is not allowed in the {stage} stage"
                            )))
                        }
                    }
                    i = j + 3;
                }
                "layout" => {
                    i = skip_group(&tokens, i + 1, "(", ")").map_err(compile_error)?;
                }
                "{" => {
                    if tokens.get(i.wrapping_sub(3)).map(String::as_str) == Some("main") {
                        has_main = true;
                    }
                    i = skip_group(&tokens, i, "{", "}").map_err(compile_error)?;
                }
                "}" | ")" => return Err(compile_error(format!("unbalanced '{}'", tokens[i]))),
                "(" => {
                    i = skip_group(&tokens, i, "(", ")").map_err(compile_error)?;
                }
                _ => i += 1,
            }
        }

        if !has_main {
            return Err(compile_error("missing entry point 'void main()'".into()));
        }
        Ok(decls)
    }

    fn resolve_type(&self, token: &str) -> Option<GlslType> {
        GlslType::builtin(token).or_else(|| {
            self.structs
                .contains_key(token)
                .then(|| GlslType::Struct(token.to_string()))
        })
    }
}

/// Index just past the group opened at `start`
fn skip_group(tokens: &[String], start: usize, open: &str, close: &str) -> Result<usize, String> {
    if tokens.get(start).map(String::as_str) != Some(open) {
        return Err(format!("expected '{open}'"));
    }
    let mut depth = 0usize;
    for (offset, token) in tokens[start..].iter().enumerate() {
        if token == open {
            depth += 1;
        } else if token == close {
            depth -= 1;
            if depth == 0 {
                return Ok(start + offset + 1);
            }
        }
    }
    Err(format!("unterminated '{open}'"))
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn strip_comments_and_directives(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in source.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            current.push(c);
        } else {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r"
        #version 330
        uniform mat4 u_model; // model matrix
        in vec3 a_position;
        in vec2 a_texCoords;
        out vec2 v_texCoords;
        void main() {
            v_texCoords = a_texCoords;
            gl_Position = u_model * vec4(a_position, 1.0);
        }
    ";

    const FRAGMENT: &str = r"
        struct Light {
            int lightType;
            vec3 color;
        };
        /* four slots are declared by real materials */
        uniform Light u_light0;
        uniform bool u_useTexture;
        in vec2 v_texCoords;
        out vec4 fragColor;
        void main() {
            if (u_useTexture) { fragColor = vec4(1.0); }
        }
    ";

    #[test]
    fn test_interface_flattens_struct_uniforms() {
        let interface = ShaderInterface::link(VERTEX, FRAGMENT).unwrap();
        let names: Vec<_> = interface.uniforms.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            ["u_model", "u_light0.lightType", "u_light0.color", "u_useTexture"]
        );
        assert_eq!(interface.attribute_index("a_texCoords"), Some(1));
        assert_eq!(interface.attribute_index("a_vNormal"), None);
    }

    #[test]
    fn test_missing_main_is_a_compile_error() {
        let err = ShaderInterface::link("uniform mat4 u_model;", FRAGMENT).unwrap_err();
        assert!(matches!(
            err,
            GpuError::ShaderCompilation { stage: ShaderStage::Vertex, .. }
        ));
    }

    #[test]
    fn test_unknown_type_is_a_compile_error() {
        let source = "uniform Shadow u_shadow0; void main() {}";
        let err = ShaderInterface::link(VERTEX, source).unwrap_err();
        assert!(matches!(
            err,
            GpuError::ShaderCompilation { stage: ShaderStage::Fragment, .. }
        ));
    }

    #[test]
    fn test_unbalanced_braces_fail() {
        let source = "void main() { if (true) { }";
        assert!(ShaderInterface::link(VERTEX, source).is_err());
    }

    #[test]
    fn test_unmatched_varying_fails_to_link() {
        let fragment = "in vec3 v_normal; out vec4 c; void main() { c = vec4(v_normal, 1.0); }";
        let err = ShaderInterface::link(VERTEX, fragment).unwrap_err();
        assert!(matches!(err, GpuError::ProgramLink(_)));
    }
}
