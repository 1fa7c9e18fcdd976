pub fn fresh() {}