use crate::models::node_graph::{InputCoordinate, OutputCoordinate};
use crate::models::node_type::NodeType;
use crate::models::schema::{InputDefinition, OutputDefinition};
use crate::models::values::{Loop, PortValue};

use super::coercion::coerce_loop;
use super::loops::{adjusted_index, lengthen};

/// An input port and its current loop.
///
/// Whether the row is connected lives in the graph's connection table, not here.
#[derive(Clone, Debug, PartialEq)]
pub struct InputRow {
    pub id: InputCoordinate,
    pub label: String,
    pub node_type: NodeType,
    pub is_type_static: bool,
    pub copies_upstream: bool,
    values: Loop,
    /// Last value the user typed in; restored when a connection is removed.
    local_values: Loop,
}

impl InputRow {
    pub fn from_definition(id: InputCoordinate, definition: &InputDefinition) -> Self {
        let node_type = definition.node_type();
        let values = if definition.default_values.is_empty() {
            vec![node_type.default_value()]
        } else {
            definition.default_values.clone()
        };
        Self {
            id,
            label: definition.label.clone(),
            node_type,
            is_type_static: definition.is_type_static,
            copies_upstream: definition.copies_upstream,
            local_values: values.clone(),
            values,
        }
    }

    pub fn all_looped_values(&self) -> &[PortValue] {
        &self.values
    }

    /// Single value for display, indexed modulo the loop length.
    pub fn active_value(&self, active_index: usize) -> PortValue {
        self.values
            .get(adjusted_index(active_index, self.values.len()))
            .cloned()
            .unwrap_or_else(|| self.node_type.default_value())
    }

    pub fn local_values(&self) -> &[PortValue] {
        &self.local_values
    }

    /// Overwrites the loop. Returns whether anything changed.
    pub(crate) fn set_values_in_input(&mut self, values: Loop) -> bool {
        let values = if values.is_empty() {
            vec![self.node_type.default_value()]
        } else {
            values
        };
        if self.values == values {
            return false;
        }
        self.values = values;
        true
    }

    /// Records a user edit. The caller must have detached any connection first.
    pub(crate) fn set_local_values(&mut self, values: &[PortValue], graph_time: f64) -> bool {
        let values = coerce_loop(values, self.node_type, graph_time);
        self.local_values = values.clone();
        self.set_values_in_input(values)
    }

    /// Falls back to the last local edit after a connection is removed.
    pub(crate) fn restore_local_values(&mut self) -> bool {
        let local = self.local_values.clone();
        self.set_values_in_input(local)
    }

    pub(crate) fn retype(&mut self, node_type: NodeType, graph_time: f64) -> bool {
        if self.node_type == node_type {
            return false;
        }
        self.node_type = node_type;
        self.local_values = coerce_loop(&self.local_values, node_type, graph_time);
        let values = coerce_loop(&self.values, node_type, graph_time);
        self.set_values_in_input(values);
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputRow {
    pub id: OutputCoordinate,
    pub label: String,
    pub node_type: NodeType,
    values: Loop,
}

impl OutputRow {
    pub fn from_definition(id: OutputCoordinate, definition: &OutputDefinition) -> Self {
        Self {
            id,
            label: definition.label.clone(),
            node_type: definition.node_type,
            values: vec![definition.node_type.default_value()],
        }
    }

    pub fn all_looped_values(&self) -> &[PortValue] {
        &self.values
    }

    pub fn active_value(&self, active_index: usize) -> PortValue {
        self.values
            .get(adjusted_index(active_index, self.values.len()))
            .cloned()
            .unwrap_or_else(|| self.node_type.default_value())
    }

    pub(crate) fn set_values(&mut self, values: Loop) -> bool {
        let values = if values.is_empty() {
            vec![self.node_type.default_value()]
        } else {
            values
        };
        if self.values == values {
            return false;
        }
        self.values = values;
        true
    }

    /// Writes one loop index, lengthening the loop to reach it.
    pub(crate) fn set_value_at(&mut self, loop_index: usize, value: PortValue) -> bool {
        let mut values = lengthen(&self.values, loop_index + 1);
        if values.len() <= loop_index {
            values.resize(loop_index + 1, self.node_type.default_value());
        }
        values[loop_index] = value;
        self.set_values(values)
    }

    pub(crate) fn retype(&mut self, node_type: NodeType, graph_time: f64) -> bool {
        if self.node_type == node_type {
            return false;
        }
        self.node_type = node_type;
        self.values = coerce_loop(&self.values, node_type, graph_time);
        true
    }

    pub(crate) fn reset(&mut self) -> bool {
        self.set_values(vec![self.node_type.default_value()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node_graph::PortId;
    use uuid::Uuid;

    fn number_row() -> InputRow {
        InputRow::from_definition(
            InputCoordinate::new(Uuid::new_v4(), PortId::Index(0)),
            &InputDefinition::new(0, "Value", PortValue::Number(0.0)),
        )
    }

    #[test]
    fn active_value_wraps_around_the_loop() {
        let mut row = number_row();
        row.set_values_in_input(vec![PortValue::Number(1.0), PortValue::Number(2.0)]);
        assert_eq!(row.active_value(3), PortValue::Number(2.0));
    }

    #[test]
    fn empty_writes_keep_the_loop_non_empty() {
        let mut row = number_row();
        row.set_values_in_input(vec![PortValue::Number(5.0)]);
        assert!(row.set_values_in_input(Vec::new()));
        assert_eq!(row.all_looped_values(), &[PortValue::Number(0.0)]);
    }

    #[test]
    fn local_edits_are_coerced_and_restorable() {
        let mut row = number_row();
        row.set_local_values(&[PortValue::from("4")], 0.0);
        assert_eq!(row.all_looped_values(), &[PortValue::Number(4.0)]);

        row.set_values_in_input(vec![PortValue::Number(9.0)]);
        assert!(row.restore_local_values());
        assert_eq!(row.all_looped_values(), &[PortValue::Number(4.0)]);
    }

    #[test]
    fn output_value_at_lengthens_the_loop() {
        let mut row = OutputRow::from_definition(
            OutputCoordinate::new(Uuid::new_v4(), 0),
            &OutputDefinition::new("Value", NodeType::Number),
        );
        assert!(row.set_value_at(2, PortValue::Number(7.0)));
        assert_eq!(
            row.all_looped_values(),
            &[
                PortValue::Number(0.0),
                PortValue::Number(0.0),
                PortValue::Number(7.0)
            ]
        );
    }
}
