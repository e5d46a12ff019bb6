use vergen::EmitBuilder;

fn main() {
    // 生成构建时间戳，供 --version 显示
    EmitBuilder::builder()
        .all_build()
        .emit()
        .expect("Failed to generate build information");
}
