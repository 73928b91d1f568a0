fn main() {
    selection_translator_lib::run()
}
