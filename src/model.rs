//! Process-model vocabulary: BPMN namespaces and the element-kind enumeration.

/// BPMN 2.0 process model namespace.
pub const NS_MODEL: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
/// BPMN diagram interchange namespace (`bpmndi`).
pub const NS_DI: &str = "http://www.omg.org/spec/BPMN/20100524/DI";
/// Diagram definition geometry namespace (`dc`).
pub const NS_DC: &str = "http://www.omg.org/spec/DD/20100524/DC";
/// Diagram definition namespace (`di`), used for edge waypoints.
pub const NS_DD: &str = "http://www.omg.org/spec/DD/20100524/DI";
/// Camunda vendor extension namespace.
pub const NS_CAMUNDA: &str = "http://camunda.org/schema/1.0/bpmn";
/// XML Schema instance namespace.
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Serialization prefixes for the namespaces a BPMN document carries.
pub const NAMESPACE_PREFIXES: [(&str, &str); 6] = [
    (NS_MODEL, "bpmn"),
    (NS_DI, "bpmndi"),
    (NS_DC, "dc"),
    (NS_DD, "di"),
    (NS_CAMUNDA, "camunda"),
    (NS_XSI, "xsi"),
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    StartEvent,
    EndEvent,
    IntermediateThrowEvent,
    IntermediateCatchEvent,
    BoundaryEvent,
    ServiceTask,
    UserTask,
    SendTask,
    ReceiveTask,
    BusinessRuleTask,
    CallActivity,
    ExclusiveGateway,
    ParallelGateway,
    InclusiveGateway,
    SubProcess,
    Task,
    SequenceFlow,
    /// Any tag outside the fixed enumeration passes through unchanged and is
    /// later matched against the fallback dimensions.
    Other(String),
}

impl ElementKind {
    /// Resolve a kind from a namespace-stripped tag name. Unrecognized tags
    /// are never rejected.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "startEvent" => Self::StartEvent,
            "endEvent" => Self::EndEvent,
            "intermediateThrowEvent" => Self::IntermediateThrowEvent,
            "intermediateCatchEvent" => Self::IntermediateCatchEvent,
            "boundaryEvent" => Self::BoundaryEvent,
            "serviceTask" => Self::ServiceTask,
            "userTask" => Self::UserTask,
            "sendTask" => Self::SendTask,
            "receiveTask" => Self::ReceiveTask,
            "businessRuleTask" => Self::BusinessRuleTask,
            "callActivity" => Self::CallActivity,
            "exclusiveGateway" => Self::ExclusiveGateway,
            "parallelGateway" => Self::ParallelGateway,
            "inclusiveGateway" => Self::InclusiveGateway,
            "subProcess" => Self::SubProcess,
            "task" => Self::Task,
            "sequenceFlow" => Self::SequenceFlow,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::StartEvent => "startEvent",
            Self::EndEvent => "endEvent",
            Self::IntermediateThrowEvent => "intermediateThrowEvent",
            Self::IntermediateCatchEvent => "intermediateCatchEvent",
            Self::BoundaryEvent => "boundaryEvent",
            Self::ServiceTask => "serviceTask",
            Self::UserTask => "userTask",
            Self::SendTask => "sendTask",
            Self::ReceiveTask => "receiveTask",
            Self::BusinessRuleTask => "businessRuleTask",
            Self::CallActivity => "callActivity",
            Self::ExclusiveGateway => "exclusiveGateway",
            Self::ParallelGateway => "parallelGateway",
            Self::InclusiveGateway => "inclusiveGateway",
            Self::SubProcess => "subProcess",
            Self::Task => "task",
            Self::SequenceFlow => "sequenceFlow",
            Self::Other(tag) => tag,
        }
    }
}

/// A directed connection between two nodes, recorded during traversal and
/// turned into an edge record after all shapes are placed.
#[derive(Debug, Clone)]
pub struct SequenceFlow {
    pub id: String,
    pub source: Option<String>,
    pub target: Option<String>,
}
