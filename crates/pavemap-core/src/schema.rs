//! The slice of the IFC schema the traversal needs: subtype links for the
//! facility, spatial and element families, and attribute positions.

/// IfcRoot / IfcObject attribute positions.
pub const ATTR_GLOBAL_ID: usize = 0;
pub const ATTR_OWNER_HISTORY: usize = 1;
pub const ATTR_NAME: usize = 2;
pub const ATTR_OBJECT_TYPE: usize = 4;

/// IfcRelAggregates(RelatingObject, RelatedObjects)
pub const AGGREGATES_RELATING: usize = 4;
pub const AGGREGATES_RELATED: usize = 5;

/// IfcRelContainedInSpatialStructure(RelatedElements, RelatingStructure)
pub const CONTAINED_RELATED: usize = 4;
pub const CONTAINED_RELATING: usize = 5;

/// IfcRelDefinesByProperties(RelatedObjects, RelatingPropertyDefinition)
pub const DEFINES_RELATED: usize = 4;
pub const DEFINES_RELATING: usize = 5;

/// IfcPropertySet.HasProperties
pub const PSET_HAS_PROPERTIES: usize = 4;

/// IfcPropertySingleValue(Name, Specification, NominalValue, Unit)
pub const PROP_NAME: usize = 0;
pub const PROP_NOMINAL_VALUE: usize = 2;

pub const REL_AGGREGATES: &str = "IFCRELAGGREGATES";
pub const REL_CONTAINED: &str = "IFCRELCONTAINEDINSPATIALSTRUCTURE";
pub const REL_DEFINES_BY_PROPERTIES: &str = "IFCRELDEFINESBYPROPERTIES";
pub const PROPERTY_SET: &str = "IFCPROPERTYSET";
pub const PROPERTY_SINGLE_VALUE: &str = "IFCPROPERTYSINGLEVALUE";
pub const TEXT_TYPE: &str = "IFCTEXT";

/// Direct supertype of each entity type we classify (upper-case names).
/// Covers the IFC4X3 `IfcElement` subtree plus IFC2X3/IFC4 spellings such
/// as `IfcBuildingElement` and the `*StandardCase` types.
const SUPERTYPES: &[(&str, &str)] = &[
    // Spatial structure
    ("IFCSPATIALELEMENT", "IFCPRODUCT"),
    ("IFCSPATIALSTRUCTUREELEMENT", "IFCSPATIALELEMENT"),
    ("IFCFACILITY", "IFCSPATIALSTRUCTUREELEMENT"),
    ("IFCROAD", "IFCFACILITY"),
    ("IFCBRIDGE", "IFCFACILITY"),
    ("IFCRAILWAY", "IFCFACILITY"),
    ("IFCMARINEFACILITY", "IFCFACILITY"),
    ("IFCBUILDING", "IFCFACILITY"),
    ("IFCFACILITYPART", "IFCSPATIALSTRUCTUREELEMENT"),
    ("IFCROADPART", "IFCFACILITYPART"),
    ("IFCBRIDGEPART", "IFCFACILITYPART"),
    ("IFCRAILWAYPART", "IFCFACILITYPART"),
    ("IFCMARINEPART", "IFCFACILITYPART"),
    ("IFCFACILITYPARTCOMMON", "IFCFACILITYPART"),
    ("IFCSITE", "IFCSPATIALSTRUCTUREELEMENT"),
    ("IFCBUILDINGSTOREY", "IFCSPATIALSTRUCTUREELEMENT"),
    ("IFCSPACE", "IFCSPATIALSTRUCTUREELEMENT"),
    // IfcElement and its direct families
    ("IFCELEMENT", "IFCPRODUCT"),
    ("IFCBUILTELEMENT", "IFCELEMENT"),
    ("IFCBUILDINGELEMENT", "IFCELEMENT"),
    ("IFCCIVILELEMENT", "IFCELEMENT"),
    ("IFCDISTRIBUTIONELEMENT", "IFCELEMENT"),
    ("IFCELEMENTASSEMBLY", "IFCELEMENT"),
    ("IFCELEMENTCOMPONENT", "IFCELEMENT"),
    ("IFCFEATUREELEMENT", "IFCELEMENT"),
    ("IFCFURNISHINGELEMENT", "IFCELEMENT"),
    ("IFCGEOGRAPHICELEMENT", "IFCELEMENT"),
    ("IFCGEOTECHNICALELEMENT", "IFCELEMENT"),
    ("IFCTRANSPORTATIONDEVICE", "IFCELEMENT"),
    ("IFCVIRTUALELEMENT", "IFCELEMENT"),
    ("IFCEQUIPMENTELEMENT", "IFCELEMENT"),
    ("IFCELECTRICALELEMENT", "IFCELEMENT"),
    // Built elements (IfcBuildingElement before IFC4X3)
    ("IFCBEAM", "IFCBUILTELEMENT"),
    ("IFCBEAMSTANDARDCASE", "IFCBEAM"),
    ("IFCBEARING", "IFCBUILTELEMENT"),
    ("IFCBUILDINGELEMENTPROXY", "IFCBUILTELEMENT"),
    ("IFCCHIMNEY", "IFCBUILTELEMENT"),
    ("IFCCOLUMN", "IFCBUILTELEMENT"),
    ("IFCCOLUMNSTANDARDCASE", "IFCCOLUMN"),
    ("IFCCOURSE", "IFCBUILTELEMENT"),
    ("IFCCOVERING", "IFCBUILTELEMENT"),
    ("IFCCURTAINWALL", "IFCBUILTELEMENT"),
    ("IFCDEEPFOUNDATION", "IFCBUILTELEMENT"),
    ("IFCCAISSONFOUNDATION", "IFCDEEPFOUNDATION"),
    ("IFCPILE", "IFCDEEPFOUNDATION"),
    ("IFCDOOR", "IFCBUILTELEMENT"),
    ("IFCDOORSTANDARDCASE", "IFCDOOR"),
    ("IFCEARTHWORKSELEMENT", "IFCBUILTELEMENT"),
    ("IFCEARTHWORKSFILL", "IFCEARTHWORKSELEMENT"),
    ("IFCREINFORCEDSOIL", "IFCEARTHWORKSELEMENT"),
    ("IFCFOOTING", "IFCBUILTELEMENT"),
    ("IFCKERB", "IFCBUILTELEMENT"),
    ("IFCMEMBER", "IFCBUILTELEMENT"),
    ("IFCMEMBERSTANDARDCASE", "IFCMEMBER"),
    ("IFCMOORINGDEVICE", "IFCBUILTELEMENT"),
    ("IFCNAVIGATIONELEMENT", "IFCBUILTELEMENT"),
    ("IFCPAVEMENT", "IFCBUILTELEMENT"),
    ("IFCPLATE", "IFCBUILTELEMENT"),
    ("IFCPLATESTANDARDCASE", "IFCPLATE"),
    ("IFCRAIL", "IFCBUILTELEMENT"),
    ("IFCRAILING", "IFCBUILTELEMENT"),
    ("IFCRAMP", "IFCBUILTELEMENT"),
    ("IFCRAMPFLIGHT", "IFCBUILTELEMENT"),
    ("IFCROOF", "IFCBUILTELEMENT"),
    ("IFCSHADINGDEVICE", "IFCBUILTELEMENT"),
    ("IFCSLAB", "IFCBUILTELEMENT"),
    ("IFCSLABELEMENTEDCASE", "IFCSLAB"),
    ("IFCSLABSTANDARDCASE", "IFCSLAB"),
    ("IFCSTAIR", "IFCBUILTELEMENT"),
    ("IFCSTAIRFLIGHT", "IFCBUILTELEMENT"),
    ("IFCTRACKELEMENT", "IFCBUILTELEMENT"),
    ("IFCWALL", "IFCBUILTELEMENT"),
    ("IFCWALLELEMENTEDCASE", "IFCWALL"),
    ("IFCWALLSTANDARDCASE", "IFCWALL"),
    ("IFCWINDOW", "IFCBUILTELEMENT"),
    ("IFCWINDOWSTANDARDCASE", "IFCWINDOW"),
    // Distribution elements
    ("IFCDISTRIBUTIONCONTROLELEMENT", "IFCDISTRIBUTIONELEMENT"),
    ("IFCDISTRIBUTIONFLOWELEMENT", "IFCDISTRIBUTIONELEMENT"),
    ("IFCACTUATOR", "IFCDISTRIBUTIONCONTROLELEMENT"),
    ("IFCALARM", "IFCDISTRIBUTIONCONTROLELEMENT"),
    ("IFCCONTROLLER", "IFCDISTRIBUTIONCONTROLELEMENT"),
    ("IFCFLOWINSTRUMENT", "IFCDISTRIBUTIONCONTROLELEMENT"),
    ("IFCPROTECTIVEDEVICETRIPPINGUNIT", "IFCDISTRIBUTIONCONTROLELEMENT"),
    ("IFCSENSOR", "IFCDISTRIBUTIONCONTROLELEMENT"),
    ("IFCUNITARYCONTROLELEMENT", "IFCDISTRIBUTIONCONTROLELEMENT"),
    ("IFCDISTRIBUTIONCHAMBERELEMENT", "IFCDISTRIBUTIONFLOWELEMENT"),
    ("IFCENERGYCONVERSIONDEVICE", "IFCDISTRIBUTIONFLOWELEMENT"),
    ("IFCFLOWCONTROLLER", "IFCDISTRIBUTIONFLOWELEMENT"),
    ("IFCFLOWFITTING", "IFCDISTRIBUTIONFLOWELEMENT"),
    ("IFCFLOWMOVINGDEVICE", "IFCDISTRIBUTIONFLOWELEMENT"),
    ("IFCFLOWSEGMENT", "IFCDISTRIBUTIONFLOWELEMENT"),
    ("IFCFLOWSTORAGEDEVICE", "IFCDISTRIBUTIONFLOWELEMENT"),
    ("IFCFLOWTERMINAL", "IFCDISTRIBUTIONFLOWELEMENT"),
    ("IFCFLOWTREATMENTDEVICE", "IFCDISTRIBUTIONFLOWELEMENT"),
    ("IFCAIRTOAIRHEATRECOVERY", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCBOILER", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCBURNER", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCCHILLER", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCCOIL", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCCONDENSER", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCCOOLEDBEAM", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCCOOLINGTOWER", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCELECTRICGENERATOR", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCELECTRICMOTOR", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCENGINE", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCEVAPORATIVECOOLER", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCEVAPORATOR", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCHEATEXCHANGER", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCHUMIDIFIER", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCMOTORCONNECTION", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCSOLARDEVICE", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCTRANSFORMER", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCTUBEBUNDLE", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCUNITARYEQUIPMENT", "IFCENERGYCONVERSIONDEVICE"),
    ("IFCAIRTERMINALBOX", "IFCFLOWCONTROLLER"),
    ("IFCDAMPER", "IFCFLOWCONTROLLER"),
    ("IFCELECTRICDISTRIBUTIONBOARD", "IFCFLOWCONTROLLER"),
    ("IFCELECTRICTIMECONTROL", "IFCFLOWCONTROLLER"),
    ("IFCFLOWMETER", "IFCFLOWCONTROLLER"),
    ("IFCPROTECTIVEDEVICE", "IFCFLOWCONTROLLER"),
    ("IFCSWITCHINGDEVICE", "IFCFLOWCONTROLLER"),
    ("IFCVALVE", "IFCFLOWCONTROLLER"),
    ("IFCCABLECARRIERFITTING", "IFCFLOWFITTING"),
    ("IFCCABLEFITTING", "IFCFLOWFITTING"),
    ("IFCDUCTFITTING", "IFCFLOWFITTING"),
    ("IFCJUNCTIONBOX", "IFCFLOWFITTING"),
    ("IFCPIPEFITTING", "IFCFLOWFITTING"),
    ("IFCCOMPRESSOR", "IFCFLOWMOVINGDEVICE"),
    ("IFCFAN", "IFCFLOWMOVINGDEVICE"),
    ("IFCPUMP", "IFCFLOWMOVINGDEVICE"),
    ("IFCCABLECARRIERSEGMENT", "IFCFLOWSEGMENT"),
    ("IFCCABLESEGMENT", "IFCFLOWSEGMENT"),
    ("IFCCONVEYORSEGMENT", "IFCFLOWSEGMENT"),
    ("IFCDUCTSEGMENT", "IFCFLOWSEGMENT"),
    ("IFCPIPESEGMENT", "IFCFLOWSEGMENT"),
    ("IFCELECTRICFLOWSTORAGEDEVICE", "IFCFLOWSTORAGEDEVICE"),
    ("IFCTANK", "IFCFLOWSTORAGEDEVICE"),
    ("IFCAIRTERMINAL", "IFCFLOWTERMINAL"),
    ("IFCAUDIOVISUALAPPLIANCE", "IFCFLOWTERMINAL"),
    ("IFCCOMMUNICATIONSAPPLIANCE", "IFCFLOWTERMINAL"),
    ("IFCELECTRICAPPLIANCE", "IFCFLOWTERMINAL"),
    ("IFCFIRESUPPRESSIONTERMINAL", "IFCFLOWTERMINAL"),
    ("IFCLAMP", "IFCFLOWTERMINAL"),
    ("IFCLIGHTFIXTURE", "IFCFLOWTERMINAL"),
    ("IFCLIQUIDTERMINAL", "IFCFLOWTERMINAL"),
    ("IFCMEDICALDEVICE", "IFCFLOWTERMINAL"),
    ("IFCMOBILETELECOMMUNICATIONSAPPLIANCE", "IFCFLOWTERMINAL"),
    ("IFCOUTLET", "IFCFLOWTERMINAL"),
    ("IFCSANITARYTERMINAL", "IFCFLOWTERMINAL"),
    ("IFCSIGNAL", "IFCFLOWTERMINAL"),
    ("IFCSPACEHEATER", "IFCFLOWTERMINAL"),
    ("IFCSTACKTERMINAL", "IFCFLOWTERMINAL"),
    ("IFCWASTETERMINAL", "IFCFLOWTERMINAL"),
    ("IFCDUCTSILENCER", "IFCFLOWTREATMENTDEVICE"),
    ("IFCELECTRICFLOWTREATMENTDEVICE", "IFCFLOWTREATMENTDEVICE"),
    ("IFCFILTER", "IFCFLOWTREATMENTDEVICE"),
    ("IFCINTERCEPTOR", "IFCFLOWTREATMENTDEVICE"),
    // Element components
    ("IFCBUILDINGELEMENTPART", "IFCELEMENTCOMPONENT"),
    ("IFCDISCRETEACCESSORY", "IFCELEMENTCOMPONENT"),
    ("IFCFASTENER", "IFCELEMENTCOMPONENT"),
    ("IFCIMPACTPROTECTIONDEVICE", "IFCELEMENTCOMPONENT"),
    ("IFCMECHANICALFASTENER", "IFCELEMENTCOMPONENT"),
    ("IFCREINFORCINGELEMENT", "IFCELEMENTCOMPONENT"),
    ("IFCSIGN", "IFCELEMENTCOMPONENT"),
    ("IFCVIBRATIONDAMPER", "IFCELEMENTCOMPONENT"),
    ("IFCVIBRATIONISOLATOR", "IFCELEMENTCOMPONENT"),
    ("IFCREINFORCINGBAR", "IFCREINFORCINGELEMENT"),
    ("IFCREINFORCINGMESH", "IFCREINFORCINGELEMENT"),
    ("IFCTENDON", "IFCREINFORCINGELEMENT"),
    ("IFCTENDONANCHOR", "IFCREINFORCINGELEMENT"),
    ("IFCTENDONCONDUIT", "IFCREINFORCINGELEMENT"),
    // Features
    ("IFCFEATUREELEMENTADDITION", "IFCFEATUREELEMENT"),
    ("IFCPROJECTIONELEMENT", "IFCFEATUREELEMENTADDITION"),
    ("IFCFEATUREELEMENTSUBTRACTION", "IFCFEATUREELEMENT"),
    ("IFCEARTHWORKSCUT", "IFCFEATUREELEMENTSUBTRACTION"),
    ("IFCOPENINGELEMENT", "IFCFEATUREELEMENTSUBTRACTION"),
    ("IFCOPENINGSTANDARDCASE", "IFCOPENINGELEMENT"),
    ("IFCVOIDINGFEATURE", "IFCFEATUREELEMENTSUBTRACTION"),
    ("IFCSURFACEFEATURE", "IFCFEATUREELEMENT"),
    // Everything else
    ("IFCFURNITURE", "IFCFURNISHINGELEMENT"),
    ("IFCSYSTEMFURNITUREELEMENT", "IFCFURNISHINGELEMENT"),
    ("IFCGEOTECHNICALASSEMBLY", "IFCGEOTECHNICALELEMENT"),
    ("IFCBOREHOLE", "IFCGEOTECHNICALASSEMBLY"),
    ("IFCGEOMODEL", "IFCGEOTECHNICALASSEMBLY"),
    ("IFCGEOSLICE", "IFCGEOTECHNICALASSEMBLY"),
    ("IFCGEOTECHNICALSTRATUM", "IFCGEOTECHNICALELEMENT"),
    ("IFCTRANSPORTELEMENT", "IFCTRANSPORTATIONDEVICE"),
    ("IFCVEHICLE", "IFCTRANSPORTATIONDEVICE"),
];

pub fn supertype(type_name: &str) -> Option<&'static str> {
    SUPERTYPES
        .iter()
        .find(|(sub, _)| sub.eq_ignore_ascii_case(type_name))
        .map(|(_, sup)| *sup)
}

/// IFC subtype test. Types missing from the table only match themselves.
pub fn is_a(type_name: &str, ancestor: &str) -> bool {
    let mut current = Some(type_name);
    while let Some(name) = current {
        if name.eq_ignore_ascii_case(ancestor) {
            return true;
        }
        current = supertype(name);
    }
    false
}

/// Coarse classification driving the hierarchy walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Facility,
    RoadPart,
    ElementAssembly,
    Pavement,
    Course,
    /// Any other `IfcElement` subtype.
    Element,
    Other,
}

impl ElementKind {
    pub fn classify(type_name: &str) -> Self {
        if is_a(type_name, "IFCCOURSE") {
            ElementKind::Course
        } else if is_a(type_name, "IFCPAVEMENT") {
            ElementKind::Pavement
        } else if is_a(type_name, "IFCROADPART") {
            ElementKind::RoadPart
        } else if is_a(type_name, "IFCELEMENTASSEMBLY") {
            ElementKind::ElementAssembly
        } else if is_a(type_name, "IFCELEMENT") {
            ElementKind::Element
        } else if is_a(type_name, "IFCFACILITY") {
            ElementKind::Facility
        } else {
            ElementKind::Other
        }
    }

    /// True for every kind that is an `IfcElement`.
    pub fn is_element(self) -> bool {
        matches!(
            self,
            ElementKind::Course | ElementKind::Pavement | ElementKind::ElementAssembly | ElementKind::Element
        )
    }
}
