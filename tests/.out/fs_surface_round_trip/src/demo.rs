fn demo() {}
