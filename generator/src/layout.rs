// layout.rs — Layout tables for the generated model interface
//
// Projects a `ModelDescriptor` into the tables the model framework reads:
// struct layouts, parameter/signal attribute lists with their dimension
// lists, the parameter size block, signal address initializers and the
// external IO list. Rendering to C text is left to `codegen`.
//
// Preconditions: `model` was produced by the parser (dimensions >= 1,
//                identifiers valid).
// Postconditions: every per-channel table of a kind has one entry per
//                 channel, in full declaration order; attribute offsets are
//                 `OFFSET_STRIDE * index`.
// Failure modes: none.
// Side effects: none.

use crate::model::{Category, Channel, ChannelKind, ChannelTable, DataType, ModelDescriptor, Shape};

/// Fixed tag carried by every parameter and signal attribute entry.
pub const ATTRIBUTE_TAG: u32 = 2;

/// Distance between the offsets of consecutive attribute entries.
pub const OFFSET_STRIDE: usize = 2;

/// Name of the global signal storage the address initializers refer to.
pub const SIGNAL_STORAGE: &str = "rtSignal";

// ── Public types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTables {
    pub inports: StructLayout,
    pub outports: StructLayout,
    pub parameters: StructLayout,
    pub signals: StructLayout,
    pub parameter_tables: ParameterTables,
    pub signal_tables: SignalTables,
    pub external_io: ExternalIoList,
}

/// A C struct typedef: top-level fields and nested category groups.
#[derive(Debug, Clone, PartialEq)]
pub struct StructLayout {
    pub name: &'static str,
    pub members: Vec<StructMember>,
}

impl StructLayout {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructMember {
    Field(FieldDecl),
    /// `struct <tag> { fields } <name>;`
    Group {
        tag: String,
        name: String,
        fields: Vec<FieldDecl>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub c_type: &'static str,
    pub name: String,
    /// Array suffixes, outermost first.
    pub dims: Vec<u32>,
}

/// One entry of `rtParamAttribs` or `rtSignalAttribs`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEntry {
    /// Name published to the framework (`cat/name`, `model/cat/name`).
    pub path: String,
    /// C member access path inside the struct (`cat.name`).
    pub member: String,
    /// Signals only.
    pub description: Option<String>,
    pub data_type: DataType,
    pub element_count: u64,
    pub tag: u32,
    pub offset: usize,
}

/// One `dimX, dimY` pair of `ParamDimList` or `SigDimList`.
#[derive(Debug, Clone, PartialEq)]
pub struct DimEntry {
    pub dim_x: u32,
    pub dim_y: u32,
    pub label: String,
}

/// One per-parameter entry of `Parameters_sizes`.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeEntry {
    pub data_type: DataType,
    pub element_count: u64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterTables {
    pub attributes: Vec<AttributeEntry>,
    pub dims: Vec<DimEntry>,
    pub sizes: Vec<SizeEntry>,
}

impl ParameterTables {
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Assignment of a signal's storage address to its attribute entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalAddress {
    pub index: usize,
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalTables {
    pub attributes: Vec<AttributeEntry>,
    pub dims: Vec<DimEntry>,
    pub addresses: Vec<SignalAddress>,
}

impl SignalTables {
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn code(self) -> u32 {
        match self {
            Direction::Input => 0,
            Direction::Output => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalIoEntry {
    pub path: String,
    pub direction: Direction,
    pub dim_x: u32,
    pub dim_y: u32,
}

/// Inports followed by outports.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExternalIoList {
    pub inport_count: usize,
    pub outport_count: usize,
    pub entries: Vec<ExternalIoEntry>,
}

impl ExternalIoList {
    pub fn total(&self) -> usize {
        self.inport_count + self.outport_count
    }

    pub fn inputs(&self) -> &[ExternalIoEntry] {
        &self.entries[..self.inport_count]
    }

    pub fn outputs(&self) -> &[ExternalIoEntry] {
        &self.entries[self.inport_count..]
    }
}

// ── Public entry point ──────────────────────────────────────────────────────

pub fn build_layout(model: &ModelDescriptor) -> LayoutTables {
    LayoutTables {
        inports: struct_layout(model, ChannelKind::Inport),
        outports: struct_layout(model, ChannelKind::Outport),
        parameters: struct_layout(model, ChannelKind::Parameter),
        signals: struct_layout(model, ChannelKind::Signal),
        parameter_tables: parameter_tables(&model.parameters),
        signal_tables: signal_tables(&model.name, &model.signals),
        external_io: external_io(&model.inports, &model.outports),
    }
}

// ── Struct layout ───────────────────────────────────────────────────────────

fn field_decl(channel: &Channel) -> FieldDecl {
    FieldDecl {
        c_type: channel.data_type.c_type(),
        name: channel.name.clone(),
        dims: channel.array_dims(),
    }
}

fn struct_layout(model: &ModelDescriptor, kind: ChannelKind) -> StructLayout {
    let name = kind.struct_name();
    let members = model
        .table(kind)
        .groups()
        .flat_map(|(category, channels)| match category {
            Category::Default => channels
                .iter()
                .map(|c| StructMember::Field(field_decl(c)))
                .collect::<Vec<_>>(),
            Category::Named(cat) => vec![StructMember::Group {
                tag: format!("{}_{}", name, cat),
                name: cat.clone(),
                fields: channels.iter().map(field_decl).collect(),
            }],
        })
        .collect();
    StructLayout { name, members }
}

// ── Attribute and dimension lists ───────────────────────────────────────────

fn dim_entry(category: &Category, channel: &Channel) -> DimEntry {
    DimEntry {
        dim_x: channel.dim_x,
        dim_y: channel.dim_y,
        label: category.qualify(&channel.name, '.'),
    }
}

fn parameter_tables(parameters: &ChannelTable) -> ParameterTables {
    let mut tables = ParameterTables::default();
    for (index, (category, param)) in parameters.iter().enumerate() {
        tables.attributes.push(AttributeEntry {
            path: category.qualify(&param.name, '/'),
            member: category.qualify(&param.name, '.'),
            description: None,
            data_type: param.data_type,
            element_count: param.element_count(),
            tag: ATTRIBUTE_TAG,
            offset: OFFSET_STRIDE * index,
        });
        tables.dims.push(dim_entry(category, param));
        tables.sizes.push(SizeEntry {
            data_type: param.data_type,
            element_count: param.element_count(),
            label: category.qualify(&param.name, '.'),
        });
    }
    tables
}

/// Address expression for a signal field: the field's address for scalars,
/// the (decaying) array itself for vectors, the first row for matrices.
pub fn signal_address(member: &str, shape: Shape) -> String {
    match shape {
        Shape::Scalar => format!("&{}.{}", SIGNAL_STORAGE, member),
        Shape::Vector => format!("{}.{}", SIGNAL_STORAGE, member),
        Shape::Matrix => format!("*{}.{}", SIGNAL_STORAGE, member),
    }
}

fn signal_tables(model_name: &str, signals: &ChannelTable) -> SignalTables {
    let mut tables = SignalTables::default();
    for (index, (category, sig)) in signals.iter().enumerate() {
        let member = category.qualify(&sig.name, '.');
        tables.attributes.push(AttributeEntry {
            path: format!("{}/{}", model_name, category.qualify(&sig.name, '/')),
            member: member.clone(),
            description: Some(sig.description.clone().unwrap_or_else(|| sig.name.clone())),
            data_type: sig.data_type,
            element_count: sig.element_count(),
            tag: ATTRIBUTE_TAG,
            offset: OFFSET_STRIDE * index,
        });
        tables.dims.push(dim_entry(category, sig));
        tables.addresses.push(SignalAddress {
            index,
            expr: signal_address(&member, sig.shape()),
        });
    }
    tables
}

// ── External IO ─────────────────────────────────────────────────────────────

fn external_io(inports: &ChannelTable, outports: &ChannelTable) -> ExternalIoList {
    let ports = inports
        .iter()
        .map(|p| (p, Direction::Input))
        .chain(outports.iter().map(|p| (p, Direction::Output)));
    ExternalIoList {
        inport_count: inports.len(),
        outport_count: outports.len(),
        entries: ports
            .map(|((category, port), direction)| ExternalIoEntry {
                path: category.qualify(&port.name, '/'),
                direction,
                dim_x: port.dim_x,
                dim_y: port.dim_y,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_config;

    fn layout_of(json: &str) -> LayoutTables {
        let parsed = parse_config(json).expect("config should parse");
        build_layout(&parsed.model)
    }

    #[test]
    fn offsets_follow_declaration_order_across_categories() {
        let layout = layout_of(
            r#"{"name": "m", "builder": "b", "baserate": 1,
                "parameters": ["g.a", "b", "g.c", "h.d"]}"#,
        );
        let t = &layout.parameter_tables;
        let paths: Vec<&str> = t.attributes.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["g/a", "g/c", "b", "h/d"]);
        let offsets: Vec<usize> = t.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 2, 4, 6]);
        let labels: Vec<&str> = t.dims.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["g.a", "g.c", "b", "h.d"]);
        assert_eq!(t.sizes.len(), 4);
    }

    #[test]
    fn struct_groups_use_prefixed_tags() {
        let layout = layout_of(
            r#"{"name": "m", "builder": "b", "baserate": 1,
                "inports": ["s", {"name": "vec.v", "dimX": 8}],
                "outports": [{"name": "vec.v", "dimX": 3, "dimY": 5}]}"#,
        );
        assert_eq!(
            layout.inports.members,
            vec![
                StructMember::Field(FieldDecl {
                    c_type: "double",
                    name: "s".into(),
                    dims: vec![],
                }),
                StructMember::Group {
                    tag: "Inports_vec".into(),
                    name: "vec".into(),
                    fields: vec![FieldDecl {
                        c_type: "double",
                        name: "v".into(),
                        dims: vec![8],
                    }],
                },
            ]
        );
        match &layout.outports.members[0] {
            StructMember::Group { tag, fields, .. } => {
                assert_eq!(tag, "Outports_vec");
                assert_eq!(fields[0].dims, vec![3, 5]);
            }
            other => panic!("expected a group, got {:?}", other),
        }
        assert!(layout.parameters.is_empty());
    }

    #[test]
    fn signal_addresses_by_shape() {
        let layout = layout_of(
            r#"{"name": "m", "builder": "b", "baserate": 1,
                "signals": ["s", {"name": "g.v", "dimX": 4}, {"name": "mx", "dimX": 2, "dimY": 2},
                            {"name": "row", "dimY": 3}]}"#,
        );
        // `mx` and `row` join the default group, which was opened by `s`.
        let exprs: Vec<&str> = layout
            .signal_tables
            .addresses
            .iter()
            .map(|a| a.expr.as_str())
            .collect();
        assert_eq!(
            exprs,
            vec!["&rtSignal.s", "*rtSignal.mx", "*rtSignal.row", "rtSignal.g.v"]
        );
        let paths: Vec<&str> = layout
            .signal_tables
            .attributes
            .iter()
            .map(|a| a.path.as_str())
            .collect();
        assert_eq!(paths, vec!["m/s", "m/mx", "m/row", "m/g/v"]);
        let indices: Vec<usize> = layout.signal_tables.addresses.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn external_io_lists_inports_then_outports() {
        let layout = layout_of(
            r#"{"name": "m", "builder": "b", "baserate": 1,
                "outports": ["o"], "inports": ["a.x", "a.y"]}"#,
        );
        let io = &layout.external_io;
        assert_eq!((io.inport_count, io.outport_count, io.total()), (2, 1, 3));
        let paths: Vec<&str> = io.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a/x", "a/y", "o"]);
        assert!(io.inputs().iter().all(|e| e.direction == Direction::Input));
        assert!(io.outputs().iter().all(|e| e.direction == Direction::Output));
    }

    #[test]
    fn empty_model_has_empty_tables() {
        let layout = layout_of(r#"{"name": "m", "builder": "b", "baserate": 1}"#);
        assert!(layout.parameter_tables.is_empty());
        assert!(layout.signal_tables.is_empty());
        assert_eq!(layout.external_io.total(), 0);
        assert!(layout.inports.is_empty());
    }
}
