// model.rs — Model descriptor types
//
// The validated, immutable description of a model interface produced by the
// parser. Every later stage (layout, codegen, build files) borrows it.
//
// Categories keep first-seen order and channels keep declaration order; the
// generated array indices and offsets are derived from that order.

use indexmap::IndexMap;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

// ── Category ────────────────────────────────────────────────────────────────

/// Grouping namespace of a channel, taken from a dotted name prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// No prefix: the channel sits directly in the enclosing struct.
    Default,
    /// `cat.name`: the channel sits in the nested group `cat`.
    Named(String),
}

impl Category {
    pub fn name(&self) -> Option<&str> {
        match self {
            Category::Default => None,
            Category::Named(name) => Some(name),
        }
    }

    /// Join the category and a channel name with `sep` (`cat/name`,
    /// `cat.name`), or return the bare name for the default category.
    pub fn qualify(&self, name: &str, sep: char) -> String {
        match self {
            Category::Default => name.to_string(),
            Category::Named(cat) => format!("{}{}{}", cat, sep, name),
        }
    }
}

// ── Data types ──────────────────────────────────────────────────────────────

/// Element type of a parameter or signal. Ports are always `Double`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Double,
    Int32,
}

impl DataType {
    /// Parse the `type` field of a channel declaration.
    pub fn from_config(tag: &str) -> Option<DataType> {
        match tag {
            "double" => Some(DataType::Double),
            "i32" => Some(DataType::Int32),
            _ => None,
        }
    }

    pub fn c_type(self) -> &'static str {
        match self {
            DataType::Double => "double",
            DataType::Int32 => "int32_t",
        }
    }

    /// Type tag used in the attribute lists and the accessor functions.
    pub fn tag(self) -> &'static str {
        match self {
            DataType::Double => "rtDBL",
            DataType::Int32 => "rtINT",
        }
    }

    /// Numeric value behind `tag()`.
    pub fn tag_value(self) -> i32 {
        match self {
            DataType::Double => 0,
            DataType::Int32 => 1,
        }
    }
}

// ── Channel kinds ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Inport,
    Outport,
    Parameter,
    Signal,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 4] = [
        ChannelKind::Inport,
        ChannelKind::Outport,
        ChannelKind::Parameter,
        ChannelKind::Signal,
    ];

    /// Config key holding the declarations of this kind.
    pub fn section(self) -> &'static str {
        match self {
            ChannelKind::Inport => "inports",
            ChannelKind::Outport => "outports",
            ChannelKind::Parameter => "parameters",
            ChannelKind::Signal => "signals",
        }
    }

    /// Name of the generated C struct.
    pub fn struct_name(self) -> &'static str {
        match self {
            ChannelKind::Inport => "Inports",
            ChannelKind::Outport => "Outports",
            ChannelKind::Parameter => "Parameters",
            ChannelKind::Signal => "Signals",
        }
    }

    pub fn accepts_description(self) -> bool {
        self == ChannelKind::Signal
    }

    pub fn accepts_type(self) -> bool {
        matches!(self, ChannelKind::Parameter | ChannelKind::Signal)
    }
}

// ── Channels ────────────────────────────────────────────────────────────────

/// Array shape, decided solely by `(dim_x > 1, dim_y > 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Vector,
    Matrix,
}

/// One declared inport, outport, parameter or signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub name: String,
    pub dim_x: u32,
    pub dim_y: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data_type: DataType,
}

impl Channel {
    pub fn element_count(&self) -> u64 {
        u64::from(self.dim_x) * u64::from(self.dim_y)
    }

    pub fn shape(&self) -> Shape {
        if self.dim_y > 1 {
            Shape::Matrix
        } else if self.dim_x > 1 {
            Shape::Vector
        } else {
            Shape::Scalar
        }
    }

    /// Array suffix dimensions of the struct field: `[dim_x]` when either
    /// dimension exceeds 1, followed by `[dim_y]` when `dim_y` does.
    pub fn array_dims(&self) -> Vec<u32> {
        let mut dims = Vec::with_capacity(2);
        if self.dim_x > 1 || self.dim_y > 1 {
            dims.push(self.dim_x);
        }
        if self.dim_y > 1 {
            dims.push(self.dim_y);
        }
        dims
    }
}

// ── Channel table ───────────────────────────────────────────────────────────

/// Channels of one kind grouped by category.
#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    groups: IndexMap<Category, Vec<Channel>>,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a channel; a new category is placed after all existing ones.
    pub fn push(&mut self, category: Category, channel: Channel) {
        self.groups.entry(category).or_default().push(channel);
    }

    /// Total number of channels across all categories.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.groups.keys()
    }

    pub fn get(&self, category: &Category) -> Option<&[Channel]> {
        self.groups.get(category).map(Vec::as_slice)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&Category, &[Channel])> {
        self.groups.iter().map(|(cat, chans)| (cat, chans.as_slice()))
    }

    /// All channels in full declaration order (category by category).
    pub fn iter(&self) -> impl Iterator<Item = (&Category, &Channel)> {
        self.groups
            .iter()
            .flat_map(|(cat, chans)| chans.iter().map(move |c| (cat, c)))
    }
}

#[derive(Serialize)]
struct CategoryGroup<'a> {
    category: Option<&'a str>,
    channels: &'a [Channel],
}

impl Serialize for ChannelTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.groups.len()))?;
        for (category, channels) in self.groups() {
            seq.serialize_element(&CategoryGroup {
                category: category.name(),
                channels,
            })?;
        }
        seq.end()
    }
}

// ── Model descriptor ────────────────────────────────────────────────────────

/// The complete, validated model interface.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub builder: String,
    pub base_rate: f64,
    pub inports: ChannelTable,
    pub outports: ChannelTable,
    pub parameters: ChannelTable,
    pub signals: ChannelTable,
}

impl ModelDescriptor {
    pub fn table(&self, kind: ChannelKind) -> &ChannelTable {
        match kind {
            ChannelKind::Inport => &self.inports,
            ChannelKind::Outport => &self.outports,
            ChannelKind::Parameter => &self.parameters,
            ChannelKind::Signal => &self.signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chan(name: &str, dim_x: u32, dim_y: u32) -> Channel {
        Channel {
            name: name.to_string(),
            dim_x,
            dim_y,
            description: None,
            data_type: DataType::Double,
        }
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let mut table = ChannelTable::new();
        table.push(Category::Named("b".into()), chan("x", 1, 1));
        table.push(Category::Default, chan("y", 1, 1));
        table.push(Category::Named("b".into()), chan("z", 1, 1));
        table.push(Category::Named("a".into()), chan("w", 1, 1));

        let cats: Vec<&Category> = table.categories().collect();
        assert_eq!(
            cats,
            vec![
                &Category::Named("b".into()),
                &Category::Default,
                &Category::Named("a".into()),
            ]
        );
        let names: Vec<&str> = table.iter().map(|(_, c)| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "z", "y", "w"]);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn default_category_is_not_a_string() {
        let mut table = ChannelTable::new();
        table.push(Category::Named(":default".into()), chan("x", 1, 1));
        table.push(Category::Default, chan("y", 1, 1));
        assert_eq!(table.categories().count(), 2);
    }

    #[test]
    fn shapes_and_array_dims() {
        assert_eq!(chan("s", 1, 1).shape(), Shape::Scalar);
        assert_eq!(chan("v", 4, 1).shape(), Shape::Vector);
        assert_eq!(chan("m", 4, 4).shape(), Shape::Matrix);
        assert_eq!(chan("r", 1, 3).shape(), Shape::Matrix);

        assert!(chan("s", 1, 1).array_dims().is_empty());
        assert_eq!(chan("v", 4, 1).array_dims(), vec![4]);
        assert_eq!(chan("m", 2, 12).array_dims(), vec![2, 12]);
        assert_eq!(chan("r", 1, 3).array_dims(), vec![1, 3]);
        assert_eq!(chan("m", 2, 12).element_count(), 24);
    }

    #[test]
    fn qualify_names() {
        assert_eq!(Category::Default.qualify("x", '/'), "x");
        assert_eq!(Category::Named("vec".into()).qualify("x", '/'), "vec/x");
        assert_eq!(Category::Named("vec".into()).qualify("x", '.'), "vec.x");
    }

    #[test]
    fn data_type_tags() {
        assert_eq!(DataType::from_config("i32"), Some(DataType::Int32));
        assert_eq!(DataType::from_config("double"), Some(DataType::Double));
        assert_eq!(DataType::from_config("float"), None);
        assert_eq!(DataType::Int32.c_type(), "int32_t");
        assert_eq!(DataType::Int32.tag(), "rtINT");
        assert_eq!(DataType::Double.tag_value(), 0);
    }

    #[test]
    fn table_serializes_as_ordered_groups() {
        let mut table = ChannelTable::new();
        table.push(Category::Named("a".into()), chan("x", 2, 1));
        table.push(Category::Default, chan("y", 1, 1));
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[0]["category"], "a");
        assert_eq!(json[0]["channels"][0]["name"], "x");
        assert_eq!(json[0]["channels"][0]["dim_x"], 2);
        assert!(json[1]["category"].is_null());
        assert_eq!(json[1]["channels"][0]["data_type"], "double");
    }
}
