//! Small helpers over quick-xml shared by the part readers.

use quick_xml::events::BytesStart;

/// Look up an attribute by local name, ignoring its namespace prefix.
pub(super) fn attr(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attribute| attribute.key.local_name().as_ref() == name)
        .and_then(|attribute| {
            attribute
                .unescape_value()
                .ok()
                .map(|value| value.into_owned())
        })
}

/// Interpret a WordprocessingML on/off property such as `<w:b/>` or `<w:b w:val="0"/>`.
pub(super) fn toggle(element: &BytesStart<'_>) -> bool {
    !matches!(
        attr(element, b"val").as_deref(),
        Some("0" | "false" | "off" | "none")
    )
}
