/// Vietnamese label for an OSM attraction type. Unknown types pass through.
pub fn type_label(kind: &str) -> &str {
    match kind {
        "attraction" => "Điểm tham quan",
        "museum" => "Bảo tàng",
        "viewpoint" => "Điểm ngắm cảnh",
        "artwork" => "Tác phẩm nghệ thuật",
        "gallery" => "Phòng trưng bày",
        "monument" => "Di tích",
        "castle" => "Lâu đài",
        "place_of_worship" => "Nơi thờ cúng",
        "theatre" => "Nhà hát",
        "historic" => "Di tích lịch sử",
        other => other,
    }
}
