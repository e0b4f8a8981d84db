//! Color tokens for group boxes. Groups without an explicit color in the
//! schema model are assigned one of these by declaration order.

const GROUP_COLORS: [&str; 8] = [
    "#E3F2FD", "#E8F5E9", "#FFF3E0", "#F3E5F5", "#FFEBEE", "#E0F7FA", "#FFFDE7", "#EFEBE9",
];

pub fn group_color(index: usize) -> &'static str {
    GROUP_COLORS[index % GROUP_COLORS.len()]
}
