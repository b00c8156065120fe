// codegen.rs — C code generation for VeriStand models
//
// Renders the layout tables into the two model artifacts: `model.h` with the
// parameter struct, and the model source with the remaining struct typedefs,
// framework tables and entry points. Text is built with tab indentation and
// then normalized (dedent, trim, tab expansion) per `CodegenOptions`.
//
// Preconditions: `layout` was built from `model`.
// Postconditions: returns `GeneratedCode` with header and source text, each
//                 ending in a single newline.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use crate::layout::*;
use crate::model::{DataType, ModelDescriptor};

// ── Public types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub header: String,
    pub source: String,
}

/// Indentation of the generated C text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
    Tabs,
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(2)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    pub indent: Indent,
}

// ── Public entry point ──────────────────────────────────────────────────────

pub fn codegen(
    model: &ModelDescriptor,
    layout: &LayoutTables,
    options: &CodegenOptions,
) -> GeneratedCode {
    let mut ctx = CodegenCtx::new(model, layout);
    ctx.emit_header();
    let header = normalize(&ctx.take(), options.indent);
    ctx.emit_source();
    let source = normalize(&ctx.take(), options.indent);
    GeneratedCode { header, source }
}

// ── Whitespace normalization ────────────────────────────────────────────────

/// Strip the common leading indentation, trim surrounding blank content,
/// expand tabs (unless `Indent::Tabs`) and end with one newline.
pub fn normalize(text: &str, indent: Indent) -> String {
    let dedented = dedent(text);
    let trimmed = dedented.trim();
    let mut out = String::with_capacity(trimmed.len() + 1);
    for (i, line) in trimmed.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match indent {
            Indent::Tabs => out.push_str(line),
            Indent::Spaces(width) => expand_tabs(line, width, &mut out),
        }
    }
    out.push('\n');
    out
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = leading_whitespace(line);
        margin = Some(match margin {
            None => indent,
            Some(m) => {
                let common = m
                    .bytes()
                    .zip(indent.bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                &m[..common]
            }
        });
    }
    let margin = margin.unwrap_or("");

    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(line.strip_prefix(margin).unwrap_or(line));
    }
    out
}

/// Expand tabs to the next multiple of `width` columns.
fn expand_tabs(line: &str, width: usize, out: &mut String) {
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            if width > 0 {
                let pad = width - column % width;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
        } else {
            out.push(c);
            column += 1;
        }
    }
}

// ── Literal helpers ─────────────────────────────────────────────────────────

/// Quote `text` as a C string literal.
pub fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Format a value as a C double literal (always with `.` or an exponent).
pub fn c_double(value: f64) -> String {
    format!("{:?}", value)
}

// ── Shared emitters ─────────────────────────────────────────────────────────

fn emit_struct(out: &mut String, comment: &str, layout: &StructLayout) {
    let _ = writeln!(out, "/* {} */", comment);
    let _ = writeln!(out, "typedef struct {} {{", layout.name);
    for member in &layout.members {
        match member {
            StructMember::Field(field) => emit_field(out, field, 1),
            StructMember::Group { tag, name, fields } => {
                let _ = writeln!(out, "\tstruct {} {{", tag);
                for field in fields {
                    emit_field(out, field, 2);
                }
                let _ = writeln!(out, "\t}} {};", name);
            }
        }
    }
    let _ = writeln!(out, "}} {};", layout.name);
}

fn emit_field(out: &mut String, field: &FieldDecl, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
    let _ = write!(out, "{} {}", field.c_type, field.name);
    for dim in &field.dims {
        let _ = write!(out, "[{}]", dim);
    }
    out.push_str(";\n");
}

/// `dimX, dimY` rows, right-aligned to two columns.
fn emit_dim_list(out: &mut String, dims: &[DimEntry]) {
    for dim in dims {
        let _ = writeln!(out, "\t{:>2}, {:>2}, /* {} */", dim.dim_x, dim.dim_y, dim.label);
    }
}

// ── Internal context ────────────────────────────────────────────────────────

struct CodegenCtx<'a> {
    model: &'a ModelDescriptor,
    layout: &'a LayoutTables,
    out: String,
}

impl<'a> CodegenCtx<'a> {
    fn new(model: &'a ModelDescriptor, layout: &'a LayoutTables) -> Self {
        CodegenCtx {
            model,
            layout,
            out: String::with_capacity(8192),
        }
    }

    fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    // ── Header ──────────────────────────────────────────────────────────

    fn emit_header(&mut self) {
        let guard = format!("{}_MODEL_H", self.model.name.to_uppercase());
        let _ = writeln!(self.out, "#ifndef {}", guard);
        let _ = writeln!(self.out, "#define {}", guard);
        self.out.push('\n');
        self.out.push_str("#include <stdint.h>\n");
        self.out.push('\n');
        emit_struct(&mut self.out, "Parameters structure", &self.layout.parameters);
        self.out.push('\n');
        let _ = writeln!(self.out, "#endif /* {} */", guard);
    }

    // ── Source ──────────────────────────────────────────────────────────

    fn emit_source(&mut self) {
        self.emit_preamble();
        self.emit_port_and_signal_structs();
        self.out.push_str("#ifdef __cplusplus\n");
        self.out.push_str("extern \"C\" {\n");
        self.out.push_str("#endif /* __cplusplus */\n\n");
        self.emit_model_info();
        self.emit_parameters();
        self.emit_signals();
        self.emit_external_io();
        self.emit_accessors();
        self.emit_entry_points();
        self.out.push_str("#ifdef __cplusplus\n");
        self.out.push_str("} /* extern \"C\" */\n");
        self.out.push_str("#endif /* __cplusplus */\n");
    }

    fn emit_preamble(&mut self) {
        self.out.push_str("#include \"ni_modelframework.h\"\n");
        self.out.push_str("#include \"model.h\"\n");
        self.out.push('\n');
        self.out.push_str("#include <stddef.h> /* offsetof() */\n");
        self.out.push('\n');
        self.out
            .push_str("/* User-defined data types for parameters and signals */\n");
        for ty in [DataType::Double, DataType::Int32] {
            let _ = writeln!(self.out, "#define {} {}", ty.tag(), ty.tag_value());
        }
        self.out.push('\n');
    }

    fn emit_port_and_signal_structs(&mut self) {
        let structs = [
            ("Inports structure", &self.layout.inports),
            ("Outports structure", &self.layout.outports),
            ("Signals structure", &self.layout.signals),
        ];
        for (comment, layout) in structs {
            if !layout.is_empty() {
                emit_struct(&mut self.out, comment, layout);
                self.out.push('\n');
            }
        }
    }

    fn emit_model_info(&mut self) {
        let rate = c_double(self.model.base_rate);
        self.out.push_str("/* Model info */\n");
        self.out.push_str(
            "const char* USER_ModelName DataSection(\".NIVS.compiledmodelname\") =\n",
        );
        let _ = writeln!(self.out, "\t\t{};", c_string(&self.model.name));
        self.out
            .push_str("const char* USER_Builder DataSection(\".NIVS.builder\") =\n");
        let _ = writeln!(self.out, "\t\t{};", c_string(&self.model.builder));
        self.out.push('\n');
        self.out.push_str("/* Model baserate */\n");
        let _ = writeln!(self.out, "double USER_BaseRate = {};", rate);
        self.out.push('\n');
        self.out.push_str("/* Model task configuration */\n");
        let _ = writeln!(
            self.out,
            "NI_Task rtTaskAttribs DataSection(\".NIVS.tasklist\") = {{0, {}, 0, 0}};",
            rate
        );
        self.out.push('\n');
    }

    // ── Parameters ──────────────────────────────────────────────────────

    fn emit_parameters(&mut self) {
        let tables = &self.layout.parameter_tables;
        self.out.push_str("/* Parameters */\n");
        if !tables.is_empty() {
            self.out.push_str("extern Parameters rtParameter[2];\n");
            self.out.push_str("extern int32_t READSIDE;\n");
            self.out.push_str("#define readParam rtParameter[READSIDE]\n");
            self.out.push('\n');
        }
        let _ = writeln!(
            self.out,
            "int32_t ParameterSize DataSection(\".NIVS.paramlistsize\") = {};",
            tables.len()
        );

        if tables.is_empty() {
            self.out
                .push_str("NI_Parameter rtParamAttribs[1] DataSection(\".NIVS.paramlist\");\n");
            self.out
                .push_str("int32_t ParamDimList[1] DataSection(\".NIVS.paramdimlist\");\n");
            self.out
                .push_str("Parameters initParams DataSection(\".NIVS.defaultparams\");\n");
            self.out.push_str(
                "ParamSizeWidth Parameters_sizes[1] DataSection(\".NIVS.defaultparamsizes\");\n",
            );
            self.out.push('\n');
            return;
        }

        self.out
            .push_str("NI_Parameter rtParamAttribs[] DataSection(\".NIVS.paramlist\") = {\n");
        for attr in &tables.attributes {
            let _ = writeln!(
                self.out,
                "\t{{0, {}, offsetof(Parameters, {}), {}, {}, {}, {}, 0}},",
                c_string(&attr.path),
                attr.member,
                attr.data_type.tag(),
                attr.element_count,
                attr.tag,
                attr.offset
            );
        }
        self.out.push_str("};\n");

        self.out
            .push_str("int32_t ParamDimList[] DataSection(\".NIVS.paramdimlist\") = {\n");
        emit_dim_list(&mut self.out, &tables.dims);
        self.out.push_str("};\n");

        self.out
            .push_str("Parameters initParams DataSection(\".NIVS.defaultparams\") = {\n");
        self.out.push_str("\t/* Your default parameter values here */\n");
        self.out.push_str("};\n");

        self.out.push_str(
            "ParamSizeWidth Parameters_sizes[] DataSection(\".NIVS.defaultparamsizes\") = {\n",
        );
        self.out.push_str("\t{sizeof(Parameters), 0, 0},\n");
        for size in &tables.sizes {
            let _ = writeln!(
                self.out,
                "\t{{sizeof({}), {}, {}}}, /* {} */",
                size.data_type.c_type(),
                size.element_count,
                size.data_type.tag(),
                size.label
            );
        }
        self.out.push_str("};\n");
        self.out.push('\n');
    }

    // ── Signals ─────────────────────────────────────────────────────────

    fn emit_signals(&mut self) {
        let tables = &self.layout.signal_tables;
        self.out.push_str("/* Signals */\n");
        if !tables.is_empty() {
            let _ = writeln!(self.out, "Signals {};", SIGNAL_STORAGE);
            self.out.push('\n');
        }
        let _ = writeln!(
            self.out,
            "int32_t SignalSize DataSection(\".NIVS.siglistsize\") = {};",
            tables.len()
        );

        if tables.is_empty() {
            self.out
                .push_str("NI_Signal rtSignalAttribs[1] DataSection(\".NIVS.siglist\");\n");
            self.out
                .push_str("int32_t SigDimList[1] DataSection(\".NIVS.sigdimlist\");\n");
            self.out.push('\n');
            return;
        }

        self.out
            .push_str("NI_Signal rtSignalAttribs[] DataSection(\".NIVS.siglist\") = {\n");
        for attr in &tables.attributes {
            let description = attr.description.as_deref().unwrap_or(&attr.member);
            let _ = writeln!(
                self.out,
                "\t{{0, {}, 0, {}, 0, 0, {}, {}, {}, {}, 0}},",
                c_string(&attr.path),
                c_string(description),
                attr.data_type.tag(),
                attr.element_count,
                attr.tag,
                attr.offset
            );
        }
        self.out.push_str("};\n");

        self.out
            .push_str("int32_t SigDimList[] DataSection(\".NIVS.sigdimlist\") = {\n");
        emit_dim_list(&mut self.out, &tables.dims);
        self.out.push_str("};\n");
        self.out.push('\n');
    }

    // ── External IO ─────────────────────────────────────────────────────

    fn emit_external_io(&mut self) {
        let io = &self.layout.external_io;
        self.out.push_str("/* Inports and outports */\n");
        let _ = writeln!(self.out, "int32_t InportSize = {};", io.inport_count);
        let _ = writeln!(self.out, "int32_t OutportSize = {};", io.outport_count);
        let _ = writeln!(
            self.out,
            "int32_t ExtIOSize DataSection(\".NIVS.extlistsize\") = {};",
            io.total()
        );
        self.out
            .push_str("NI_ExternalIO rtIOAttribs[] DataSection(\".NIVS.extlist\") = {\n");
        for (comment, entries) in [("Inports", io.inputs()), ("Outports", io.outputs())] {
            if entries.is_empty() {
                continue;
            }
            let _ = writeln!(self.out, "\t/* {} */", comment);
            for entry in entries {
                let _ = writeln!(
                    self.out,
                    "\t{{0, {}, 0, {}, 1, {}, {}}},",
                    c_string(&entry.path),
                    entry.direction.code(),
                    entry.dim_x,
                    entry.dim_y
                );
            }
            self.out.push('\n');
        }
        self.out.push_str("\t/* Terminate list */\n");
        self.out.push_str("\t{-1, NULL, 0, 0, 0, 0, 0},\n");
        self.out.push_str("};\n");
        self.out.push('\n');
    }

    // ── Functions ───────────────────────────────────────────────────────

    fn emit_accessors(&mut self) {
        self.out.push_str(
            "int32_t USER_SetValueByDataType(void* ptr, int32_t idx, double value, int32_t type) {\n",
        );
        self.out.push_str("\tswitch (type) {\n");
        self.out.push_str("\t\tcase rtDBL:\n");
        self.out.push_str("\t\t\t((double*)ptr)[idx] = (double)value;\n");
        self.out.push_str("\t\t\treturn NI_OK;\n");
        self.out.push_str("\t\tcase rtINT:\n");
        self.out.push_str("\t\t\t((int32_t*)ptr)[idx] = (int32_t)value;\n");
        self.out.push_str("\t\t\treturn NI_OK;\n");
        self.out.push_str("\t}\n");
        self.out.push('\n');
        self.out.push_str("\treturn NI_ERROR;\n");
        self.out.push_str("}\n");
        self.out.push('\n');

        self.out
            .push_str("double USER_GetValueByDataType(void* ptr, int32_t idx, int32_t type) {\n");
        self.out.push_str("\tswitch (type) {\n");
        self.out.push_str("\t\tcase rtDBL:\n");
        self.out.push_str("\t\t\treturn ((double*)ptr)[idx];\n");
        self.out.push_str("\t\tcase rtINT:\n");
        self.out.push_str("\t\t\treturn (double)(((int32_t*)ptr)[idx]);\n");
        self.out.push_str("\t}\n");
        self.out.push('\n');
        self.out.push_str("\t/* Return NaN on error */\n");
        self.out.push_str("\tstatic const uint64_t nan = ~(uint64_t)0;\n");
        self.out.push_str("\treturn *(const double*)&nan;\n");
        self.out.push_str("}\n");
        self.out.push('\n');
    }

    fn emit_entry_points(&mut self) {
        self.out.push_str("int32_t USER_Initialize(void) {\n");
        let addresses = &self.layout.signal_tables.addresses;
        if !addresses.is_empty() {
            self.out.push_str("\t/* Populate pointers to signal values */\n");
            for addr in addresses {
                let _ = writeln!(
                    self.out,
                    "\trtSignalAttribs[{}].addr = (uintptr_t){};",
                    addr.index, addr.expr
                );
            }
            self.out.push('\n');
        }
        self.out.push_str("\treturn NI_OK;\n");
        self.out.push_str("}\n");
        self.out.push('\n');

        self.out.push_str("int32_t USER_ModelStart(void) {\n");
        self.out.push_str("\treturn NI_OK;\n");
        self.out.push_str("}\n");
        self.out.push('\n');

        self.out.push_str(
            "int32_t USER_TakeOneStep(double* inData, double* outData, double timestamp) {\n",
        );
        let has_inports = !self.layout.inports.is_empty();
        let has_outports = !self.layout.outports.is_empty();
        if has_inports {
            self.out
                .push_str("\tconst Inports* inports = (const Inports*)inData;\n");
        }
        if has_outports {
            self.out
                .push_str("\tOutports* outports = (Outports*)outData;\n");
        }
        if has_inports || has_outports {
            self.out.push('\n');
        }
        self.out.push_str("\treturn NI_OK;\n");
        self.out.push_str("}\n");
        self.out.push('\n');

        self.out.push_str("int32_t USER_ModelFinalize(void) {\n");
        self.out.push_str("\treturn NI_OK;\n");
        self.out.push_str("}\n");
        self.out.push('\n');
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::build_layout;
    use crate::parser::parse_config;

    fn generate(json: &str, indent: Indent) -> GeneratedCode {
        let parsed = parse_config(json).expect("config should parse");
        let layout = build_layout(&parsed.model);
        codegen(&parsed.model, &layout, &CodegenOptions { indent })
    }

    #[test]
    fn normalize_dedents_trims_and_expands() {
        let text = "\n    a\n    \tb\n\n    c  \n\n";
        assert_eq!(normalize(text, Indent::Spaces(4)), "a\n    b\n\nc\n");
        assert_eq!(normalize(text, Indent::Tabs), "a\n\tb\n\nc\n");
    }

    #[test]
    fn expand_tabs_uses_tab_stops() {
        let mut out = String::new();
        expand_tabs("ab\tc\t\td", 4, &mut out);
        assert_eq!(out, "ab  c       d");
        let mut out = String::new();
        expand_tabs("\tx", 0, &mut out);
        assert_eq!(out, "x");
    }

    #[test]
    fn c_literals() {
        assert_eq!(c_string("plain"), "\"plain\"");
        assert_eq!(c_string("say \"hi\"\\"), "\"say \\\"hi\\\"\\\\\"");
        assert_eq!(c_string("a\tb\nc"), "\"a\\tb\\nc\"");
        assert_eq!(c_string("\u{1}"), "\"\\001\"");
        assert_eq!(c_double(0.01), "0.01");
        assert_eq!(c_double(1.0), "1.0");
        assert_eq!(c_double(0.0025), "0.0025");
        assert_eq!(c_double(1e-7), "1e-7");
    }

    #[test]
    fn header_holds_only_the_parameter_struct() {
        let code = generate(
            r#"{"name": "foo", "builder": "b", "baserate": 0.01,
                "inports": ["x"], "parameters": [{"name": "k", "type": "i32", "dimX": 3}]}"#,
            Indent::Spaces(2),
        );
        assert!(code.header.starts_with("#ifndef FOO_MODEL_H\n#define FOO_MODEL_H\n"));
        assert!(code.header.contains("typedef struct Parameters {\n  int32_t k[3];\n} Parameters;\n"));
        assert!(code.header.ends_with("#endif /* FOO_MODEL_H */\n"));
        assert!(!code.header.contains("Inports"));
    }

    #[test]
    fn tabs_mode_keeps_tabs() {
        let code = generate(
            r#"{"name": "foo", "builder": "b", "baserate": 0.01, "parameters": ["k"]}"#,
            Indent::Tabs,
        );
        assert!(code.header.contains("\n\tdouble k;\n"));
        assert!(code.source.contains("\n\t\t\"foo\";\n"));
    }

    #[test]
    fn empty_sections_emit_placeholders() {
        let code = generate(
            r#"{"name": "foo", "builder": "b", "baserate": 0.01}"#,
            Indent::Spaces(2),
        );
        let src = &code.source;
        assert!(src.contains("int32_t ParameterSize DataSection(\".NIVS.paramlistsize\") = 0;\n"));
        assert!(src.contains("NI_Parameter rtParamAttribs[1] DataSection(\".NIVS.paramlist\");\n"));
        assert!(src.contains("int32_t ParamDimList[1] DataSection(\".NIVS.paramdimlist\");\n"));
        assert!(src.contains("Parameters initParams DataSection(\".NIVS.defaultparams\");\n"));
        assert!(src.contains("ParamSizeWidth Parameters_sizes[1] DataSection(\".NIVS.defaultparamsizes\");\n"));
        assert!(src.contains("int32_t SignalSize DataSection(\".NIVS.siglistsize\") = 0;\n"));
        assert!(src.contains("NI_Signal rtSignalAttribs[1] DataSection(\".NIVS.siglist\");\n"));
        assert!(src.contains("int32_t ExtIOSize DataSection(\".NIVS.extlistsize\") = 0;\n"));
        assert!(src.contains("{-1, NULL, 0, 0, 0, 0, 0},"));
        assert!(!src.contains("typedef struct Inports"));
        assert!(!src.contains("extern Parameters rtParameter[2];"));
        assert!(!src.contains("Signals rtSignal;"));
        assert!(src.contains(
            "int32_t USER_TakeOneStep(double* inData, double* outData, double timestamp) {\n  return NI_OK;\n}\n"
        ));
    }

    #[test]
    fn take_one_step_casts_port_buffers() {
        let code = generate(
            r#"{"name": "foo", "builder": "b", "baserate": 0.01,
                "inports": ["i"], "outports": ["o"]}"#,
            Indent::Spaces(2),
        );
        assert!(code.source.contains(
            "  const Inports* inports = (const Inports*)inData;\n  Outports* outports = (Outports*)outData;\n\n  return NI_OK;\n"
        ));
    }

    #[test]
    fn parameter_members_use_the_category_path() {
        let code = generate(
            r#"{"name": "foo", "builder": "b", "baserate": 0.01,
                "parameters": [{"name": "gains.kp", "dimX": 2, "dimY": 2}]}"#,
            Indent::Spaces(2),
        );
        assert!(code.source.contains(
            "  {0, \"gains/kp\", offsetof(Parameters, gains.kp), rtDBL, 4, 2, 0, 0},\n"
        ));
        assert!(code.source.contains("   2,  2, /* gains.kp */\n"));
        assert!(code.source.contains("  {sizeof(double), 4, rtDBL}, /* gains.kp */\n"));
        assert!(code.header.contains(
            "  struct Parameters_gains {\n    double kp[2][2];\n  } gains;\n"
        ));
    }
}
