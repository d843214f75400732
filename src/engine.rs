export![assets, haar];
